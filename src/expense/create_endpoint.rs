use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{AppState, Error, endpoints, timezone::get_local_offset};

use super::{
    core::{NewExpense, create_expense},
    form::parse_tags,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The raw data from the new expense form.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseForm {
    /// The amount of money spent.
    pub amount: f64,
    /// The date the money was spent.
    pub date: Date,
    /// A text description of what the expense was for.
    pub description: String,
    /// A comma separated list of tag names.
    pub tags: String,
}

/// Handler for creating an expense from the new expense form.
///
/// On success the client is redirected to the expenses page, otherwise an
/// alert describing the problem is returned.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Form(form): Form<CreateExpenseForm>,
) -> Response {
    let new_expense = match validate_form(form, &state.local_timezone) {
        Ok(new_expense) => new_expense,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_expense(new_expense, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create expense: {error}");
            error.into_alert_response()
        }
    }
}

fn validate_form(form: CreateExpenseForm, local_timezone: &str) -> Result<NewExpense, Error> {
    let Some(local_offset) = get_local_offset(local_timezone) else {
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    if form.date > today {
        return Err(Error::FutureDate(form.date));
    }

    let tags = parse_tags(&form.tags)?;

    Ok(NewExpense {
        amount: form.amount,
        description: form.description,
        occurred_at: Some(form.date.midnight().assume_offset(local_offset)),
        import_id: None,
        tags,
    })
}

#[cfg(test)]
mod create_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{db::initialize, endpoints, expense::core::get_expense, tag::TagName};

    use super::{CreateExpenseForm, CreateExpenseState, create_expense_endpoint};

    fn get_test_state() -> CreateExpenseState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateExpenseState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn create_expense_redirects_to_expenses_page() {
        let state = get_test_state();
        let form = CreateExpenseForm {
            amount: 12.5,
            date: date!(2024 - 01 - 15),
            description: "Weekly shop".to_owned(),
            tags: "groceries, food".to_owned(),
        };

        let response = create_expense_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::EXPENSES_VIEW
        );

        let conn = state.db_connection.lock().unwrap();
        let expense = get_expense(1, &conn).unwrap();
        assert_eq!(expense.amount, 12.5);
        assert_eq!(
            expense.tags,
            vec![
                TagName::new_unchecked("groceries"),
                TagName::new_unchecked("food")
            ]
        );
    }

    #[tokio::test]
    async fn create_expense_rejects_future_date() {
        let state = get_test_state();
        let tomorrow = (OffsetDateTime::now_utc() + Duration::days(1)).date();
        let form = CreateExpenseForm {
            amount: 1.0,
            date: tomorrow,
            description: String::new(),
            tags: String::new(),
        };

        let response = create_expense_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let conn = state.db_connection.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "no expense should be created for a future date");
    }

    #[tokio::test]
    async fn create_expense_rejects_empty_tag_name() {
        let state = get_test_state();
        let form = CreateExpenseForm {
            amount: 1.0,
            date: date!(2024 - 01 - 15),
            description: String::new(),
            tags: "groceries,".to_owned(),
        };

        let response = create_expense_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
