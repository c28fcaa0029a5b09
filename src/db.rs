//! Database initialization.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{expense::create_expense_tables, tag::create_tag_table, user::create_user_table};

/// Create the application tables if they do not exist.
///
/// The tables are created inside a single exclusive transaction so that a
/// partially initialized database is never left behind.
///
/// # Errors
///
/// This function will return an error if any of the SQL queries failed.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_tag_table(&transaction)?;
    create_expense_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
