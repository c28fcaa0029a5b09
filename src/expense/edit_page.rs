use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, loading_spinner},
    navigation::NavBar,
    timezone::get_local_offset,
};

use super::{
    core::{ExpenseId, get_expense},
    form::{ExpenseFormDefaults, expense_form_fields},
};

/// The state needed for the edit expense page.
#[derive(Debug, Clone)]
pub struct EditExpensePageState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the page for editing an existing expense.
///
/// Expenses imported without a usable date are given today's date in the
/// form, so saving the form assigns them a date.
pub async fn get_edit_expense_page(
    State(state): State<EditExpensePageState>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expense = match get_expense(expense_id, &connection) {
        Ok(expense) => expense,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let date = expense
        .occurred_at
        .map(|date_time| date_time.to_offset(local_offset).date())
        .unwrap_or(today);

    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();
    let form_fields = expense_form_fields(&ExpenseFormDefaults {
        amount: Some(expense.amount),
        date,
        description: Some(&expense.description),
        tags: &expense.tags,
        max_date: today,
        autofocus_amount: false,
    });

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Edit Expense" }

            form
                hx-put=(format_endpoint(endpoints::PUT_EXPENSE, expense.id))
                hx-indicator="#indicator"
                class="space-y-4 w-full"
            {
                (form_fields)

                button
                    type="submit" id="submit-button" tabindex="0"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator"
                    {
                        (loading_spinner())
                    }
                    "Save Changes"
                }
            }
        }
    };

    let page = base("Edit Expense", &[], &content);

    (StatusCode::OK, Html(page.into_string())).into_response()
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::Response,
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        expense::core::{NewExpense, create_expense},
        tag::TagName,
    };

    use super::{EditExpensePageState, get_edit_expense_page};

    fn get_test_state() -> EditExpensePageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        EditExpensePageState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    async fn parse_html(response: Response) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[tokio::test]
    async fn edit_page_prefills_expense_fields() {
        let state = get_test_state();
        let expense = {
            let conn = state.db_connection.lock().unwrap();
            create_expense(
                NewExpense {
                    amount: 12.5,
                    description: "Weekly shop".to_owned(),
                    occurred_at: Some(datetime!(2024-01-15 12:00 UTC)),
                    import_id: None,
                    tags: vec![TagName::new_unchecked("groceries")],
                },
                &conn,
            )
            .unwrap()
        };

        let response = get_edit_expense_page(State(state), Path(expense.id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );

        let form_selector = Selector::parse("form").unwrap();
        let form = html.select(&form_selector).next().expect("want a form");
        assert_eq!(
            form.value().attr("hx-put").map(str::to_owned),
            Some(format_endpoint(endpoints::PUT_EXPENSE, expense.id))
        );

        let amount_selector = Selector::parse("input[name=amount]").unwrap();
        let amount = form.select(&amount_selector).next().unwrap();
        assert_eq!(amount.value().attr("value"), Some("12.50"));

        let date_selector = Selector::parse("input[name=date]").unwrap();
        let date = form.select(&date_selector).next().unwrap();
        assert_eq!(date.value().attr("value"), Some("2024-01-15"));

        let tags_selector = Selector::parse("input[name=tags]").unwrap();
        let tags = form.select(&tags_selector).next().unwrap();
        assert_eq!(tags.value().attr("value"), Some("groceries"));
    }

    #[tokio::test]
    async fn edit_page_returns_404_for_missing_expense() {
        let state = get_test_state();

        let response = get_edit_expense_page(State(state), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
