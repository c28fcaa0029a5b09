use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, loading_spinner},
    navigation::NavBar,
    timezone::get_local_offset,
};

use super::form::{ExpenseFormDefaults, expense_form_fields};

/// The state needed for the new expense page.
#[derive(Debug, Clone)]
pub struct NewExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the page for recording a new expense.
pub async fn get_new_expense_page(State(state): State<NewExpensePageState>) -> Response {
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW).into_html();
    let form_fields = expense_form_fields(&ExpenseFormDefaults {
        amount: None,
        date: today,
        description: None,
        tags: &[],
        max_date: today,
        autofocus_amount: true,
    });

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "New Expense" }

            form
                hx-post=(endpoints::EXPENSES_API)
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
                    "Save Expense"
                }
            }
        }
    };

    let page = base("New Expense", &[], &content);

    (StatusCode::OK, Html(page.into_string())).into_response()
}
