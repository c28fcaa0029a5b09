use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
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
    core::{ExpenseId, UpdateExpense, update_expense},
    form::parse_tags,
};

/// The state needed to edit an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The raw data from the edit expense form.
#[derive(Debug, Deserialize)]
pub struct EditExpenseForm {
    /// The amount of money spent.
    pub amount: f64,
    /// The date the money was spent.
    pub date: Date,
    /// A text description of what the expense was for.
    pub description: String,
    /// A comma separated list of tag names.
    pub tags: String,
}

/// Handler for updating an expense from the edit expense form.
///
/// On success the client is redirected to the expenses page, otherwise an
/// alert describing the problem is returned.
pub async fn edit_expense_endpoint(
    State(state): State<EditExpenseState>,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<EditExpenseForm>,
) -> Response {
    let update = match validate_form(form, &state.local_timezone) {
        Ok(update) => update,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_expense(expense_id, update, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update expense {expense_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn validate_form(form: EditExpenseForm, local_timezone: &str) -> Result<UpdateExpense, Error> {
    let Some(local_offset) = get_local_offset(local_timezone) else {
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    if form.date > today {
        return Err(Error::FutureDate(form.date));
    }

    let tags = parse_tags(&form.tags)?;

    Ok(UpdateExpense {
        amount: form.amount,
        description: form.description,
        occurred_at: Some(form.date.midnight().assume_offset(local_offset)),
        tags,
    })
}
