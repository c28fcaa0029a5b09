//! Defines the route handler for the page that displays expenses as a table.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TAG_BADGE_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators},
};

use super::core::{Expense, count_expenses, get_expense_page};

/// The state needed for the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config for pagination.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for selecting a page of expenses.
#[derive(Debug, Deserialize)]
pub struct ExpensesQuery {
    /// The page number to display, starting from one.
    pub page: Option<u64>,
    /// The number of expenses to display per page.
    pub per_page: Option<u64>,
}

/// Render an overview of the user's expenses.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
    Query(query): Query<ExpensesQuery>,
) -> Response {
    let per_page = query
        .per_page
        .unwrap_or(state.pagination_config.default_page_size)
        .max(1);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expense_count = match count_expenses(&connection) {
        Ok(count) => count,
        Err(error) => return error.into_response(),
    };
    let page_count = expense_count.div_ceil(per_page).max(1);
    let curr_page = query
        .page
        .unwrap_or(state.pagination_config.default_page)
        .clamp(1, page_count);

    let expenses = match get_expense_page(per_page, (curr_page - 1) * per_page, &connection) {
        Ok(expenses) => expenses,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let indicators =
        create_pagination_indicators(curr_page, page_count, state.pagination_config.max_pages);

    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                div class="flex items-center justify-between mb-4"
                {
                    h1 class="text-2xl font-bold" { "Expenses" }

                    div class="space-x-4"
                    {
                        (link(endpoints::NEW_EXPENSE_VIEW, "Add expense"))
                        (link(endpoints::IMPORT_VIEW, "Import"))
                    }
                }

                @if expenses.is_empty()
                {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "No expenses yet. Add one or import a JSON export to get started."
                    }
                }
                @else
                {
                    div class="relative overflow-x-auto shadow-md rounded"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Tags" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for expense in &expenses
                                {
                                    (expense_table_row(expense))
                                }
                            }
                        }
                    }

                    (pagination_nav(&indicators, per_page))
                }
            }
        }
    };

    let page = base("Expenses", &[], &content);

    (StatusCode::OK, Html(page.into_string())).into_response()
}

fn expense_table_row(expense: &Expense) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-expense-row="true"
        {
            td class=(TABLE_CELL_STYLE)
            {
                @match expense.occurred_at
                {
                    Some(date_time) => (date_time.date()),
                    None => span class="text-gray-400" { "No date" },
                }
            }

            td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
            td class=(TABLE_CELL_STYLE) { (expense.description) }

            td class=(TABLE_CELL_STYLE)
            {
                @if expense.tags.is_empty()
                {
                    span class="text-gray-400" { "None" }
                }
                @else
                {
                    @for tag in &expense.tags
                    {
                        span class=(TAG_BADGE_STYLE) { (tag) }
                        " "
                    }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                a
                    href=(format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id))
                    class=(LINK_STYLE)
                {
                    "Edit"
                }
                " "
                button
                    type="button"
                    class=(BUTTON_DELETE_STYLE)
                    hx-delete=(format_endpoint(endpoints::DELETE_EXPENSE, expense.id))
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    hx-confirm="Delete this expense?"
                {
                    "Delete"
                }
            }
        }
    }
}

fn pagination_nav(indicators: &[PaginationIndicator], per_page: u64) -> Markup {
    let page_url =
        |page: u64| format!("{}?page={page}&per_page={per_page}", endpoints::EXPENSES_VIEW);

    html! {
        nav class="pagination flex justify-center mt-4" aria-label="Expense pages"
        {
            ul class="pagination inline-flex -space-x-px text-sm"
            {
                @for indicator in indicators
                {
                    li
                    {
                        @match indicator
                        {
                            PaginationIndicator::BackButton(page) =>
                                a href=(page_url(*page)) class=(LINK_STYLE) { "Previous" },
                            PaginationIndicator::Page(page) =>
                                a href=(page_url(*page)) class=(LINK_STYLE) { (page) },
                            PaginationIndicator::CurrPage(page) =>
                                span aria-current="page" class="font-bold px-1" { (page) },
                            PaginationIndicator::Ellipsis =>
                                span class="px-1" { "..." },
                            PaginationIndicator::NextButton(page) =>
                                a href=(page_url(*page)) class=(LINK_STYLE) { "Next" },
                        }
                    }
                }
            }
        }
    }
}
