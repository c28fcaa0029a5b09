//! The `Expense` type and the pages and endpoints for managing expenses.
//!
//! An expense records money spent at a point in time, with optional tags for
//! grouping. Expenses are created through the web UI or by importing a JSON
//! export, in which case they carry an import ID for deduplication and may
//! have no date.

pub mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod expenses_page;
mod form;
mod new_expense_page;

pub use core::{
    Expense, ExpenseId, NewExpense, UpdateExpense, count_expenses, create_expense,
    create_expense_tables, delete_expense, get_all_expenses, get_expense, get_expense_page,
    update_expense,
};
pub use create_endpoint::{CreateExpenseState, create_expense_endpoint};
pub use delete_endpoint::{DeleteExpenseState, delete_expense_endpoint};
pub use edit_endpoint::{EditExpenseState, edit_expense_endpoint};
pub use edit_page::{EditExpensePageState, get_edit_expense_page};
pub use expenses_page::{ExpensesPageState, get_expenses_page};
pub use new_expense_page::{NewExpensePageState, get_new_expense_page};
