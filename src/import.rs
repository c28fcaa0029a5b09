//! The import page and the endpoint for importing expenses from JSON exports.
//!
//! Uploaded files must be JSON arrays of expense records. Each record is
//! normalized with [RawExpense::normalize] and stored with an import ID
//! derived from the raw record, so importing overlapping exports skips
//! records that are already in the database.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState, Error,
    alert::Alert,
    analytics::record::RawExpense,
    endpoints,
    expense::{NewExpense, create_expense},
    html::{BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner},
    navigation::NavBar,
    tag::TagName,
};

/// The state needed for importing expenses.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn import_form_view() -> Markup {
    let import_route = endpoints::IMPORT;
    let spinner = loading_spinner();

    html! {
        form
            hx-post=(import_route)
            enctype="multipart/form-data"
            hx-disabled-elt="#files, #submit-button"
            hx-indicator="#indicator"
            hx-swap="none"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="files"
                    class="block mb-2 text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Choose file(s) to upload"
                }

                input
                    id="files"
                    type="file"
                    name="files"
                    accept="application/json"
                    placeholder="files"
                    multiple
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p
                {
                    "Upload JSON exports from your previous expense tracker to
                    import your expenses. Records that have already been
                    imported are skipped."
                }
            }

             button
                type="submit"
                id="submit-button"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (spinner) }
                " Upload Files"
            }
        }
    }
}

fn import_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW).into_html();
    let form = import_form_view();

    let content = html! {
        (nav_bar)

        div
            class="flex flex-col items-center px-6 py-8 mx-auto lg:py-0
            text-gray-900 dark:text-white"
        {
            div class="relative"
            {
                (form)
            }
        }
    };

    base("Import Expenses", &[], &content)
}

/// Route handler for the import JSON page.
pub async fn get_import_page() -> Response {
    import_view().into_response()
}

/// Route handler for importing expenses from JSON files.
///
/// Each uploaded file must be a JSON array of expense records. Records whose
/// import ID already exists in the database are skipped.
pub async fn import_expenses(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let start_time = std::time::Instant::now();
    let mut new_expenses = Vec::new();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|error| {
                tracing::error!("Could not read multipart form field: {error}");
                Error::MultipartError(error.to_string()).into_alert_response()
            })?;

        let Some(field) = field else {
            break;
        };

        let json_data = parse_multipart_field(field)
            .await
            .inspect_err(|error| tracing::debug!("Failed to parse multipart field: {error}"))
            .map_err(|error| error.into_alert_response())?;

        let records = parse_expense_records(&json_data)
            .inspect_err(|error| tracing::debug!("Failed to parse JSON: {error}"))
            .map_err(|error| error.into_alert_response())?;

        new_expenses.extend(records);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let tx = connection
        .unchecked_transaction()
        .inspect_err(|error| tracing::error!("could not start transaction: {error}"))
        .map_err(|_| Alert::error_simple("Could not import expenses").into_response(StatusCode::INTERNAL_SERVER_ERROR))?;

    let (imported, skipped) = import_expense_list(new_expenses, &tx)
        .inspect_err(|error| tracing::error!("Failed to import expenses: {error}"))
        .map_err(|_| {
            Alert::error(
                "Import failed",
                "An unexpected error occurred, please try again later",
            )
            .into_response(StatusCode::INTERNAL_SERVER_ERROR)
        })?;

    tx.commit()
        .inspect_err(|error| tracing::error!("could not commit transaction: {error}"))
        .map_err(|_| Alert::error_simple("Could not import expenses").into_response(StatusCode::INTERNAL_SERVER_ERROR))?;

    let duration = start_time.elapsed();
    let details = if skipped == 0 {
        format!(
            "Imported {imported} expenses in {:.1}ms.",
            duration.as_secs_f64() * 1000.0
        )
    } else {
        format!(
            "Imported {imported} expenses and skipped {skipped} duplicates in {:.1}ms.",
            duration.as_secs_f64() * 1000.0
        )
    };

    Ok(Alert::success("Import completed successfully!", &details)
        .into_response(StatusCode::CREATED))
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("application/json") {
        return Err(Error::NotJson);
    }

    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();

    let data = match field.text().await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

/// Parse a JSON export into new expenses ready for insertion.
///
/// The top level of the document must be an array. Each element gets an
/// import ID derived from the raw record before normalization, so the same
/// record always maps to the same import ID regardless of which export it
/// came from.
fn parse_expense_records(json_data: &str) -> Result<Vec<NewExpense>, Error> {
    let document: Value = serde_json::from_str(json_data)
        .map_err(|error| Error::InvalidJson(error.to_string()))?;

    let Value::Array(raw_records) = document else {
        return Err(Error::InvalidJson(
            "expected the top level to be an array of expense records".to_owned(),
        ));
    };

    raw_records
        .into_iter()
        .map(|value| {
            let import_id = format!("{:x}", md5::compute(value.to_string()));

            let record: RawExpense = serde_json::from_value(value)
                .map_err(|error| Error::InvalidJson(error.to_string()))?;
            let canonical = record.normalize();

            Ok(NewExpense {
                amount: canonical.amount,
                description: canonical.title,
                occurred_at: canonical.occurred_at,
                import_id: Some(import_id),
                tags: canonical
                    .tags
                    .iter()
                    .map(|tag| TagName::new_unchecked(tag))
                    .collect(),
            })
        })
        .collect()
}

/// Insert many expenses, skipping records whose import ID already exists.
///
/// Returns the number of imported and skipped expenses.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
fn import_expense_list(
    new_expenses: Vec<NewExpense>,
    connection: &Connection,
) -> Result<(usize, usize), Error> {
    let mut imported = 0;
    let mut skipped = 0;

    for new_expense in new_expenses {
        match create_expense(new_expense, connection) {
            Ok(_) => imported += 1,
            Err(Error::DuplicateImportId) => skipped += 1,
            Err(error) => return Err(error),
        }
    }

    Ok((imported, skipped))
}
