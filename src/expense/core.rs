//! The `Expense` type and the queries for storing and retrieving expenses.

use rusqlite::{Connection, Row, params};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    tag::{TagName, get_or_create_tag},
};

pub type ExpenseId = i64;

/// An amount of money spent at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The amount of money spent.
    pub amount: f64,
    /// A text description of what the expense was for.
    pub description: String,
    /// When the money was spent.
    ///
    /// Expenses imported from a JSON export may not have a usable date, in
    /// which case this is `None`.
    pub occurred_at: Option<OffsetDateTime>,
    /// An ID used to deduplicate expenses imported from JSON exports.
    ///
    /// Expenses created through the web UI have no import ID.
    pub import_id: Option<String>,
    /// The tags attached to the expense, in the order they were entered.
    pub tags: Vec<TagName>,
}

/// The data needed to create a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The amount of money spent.
    pub amount: f64,
    /// A text description of what the expense was for.
    pub description: String,
    /// When the money was spent, if known.
    pub occurred_at: Option<OffsetDateTime>,
    /// An ID used to deduplicate imported expenses.
    pub import_id: Option<String>,
    /// The tags to attach to the expense.
    pub tags: Vec<TagName>,
}

/// The editable fields of an expense.
///
/// The import ID is fixed at creation so that re-importing an overlapping
/// export does not resurrect an edited expense.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpense {
    /// The amount of money spent.
    pub amount: f64,
    /// A text description of what the expense was for.
    pub description: String,
    /// When the money was spent.
    pub occurred_at: Option<OffsetDateTime>,
    /// The tags to attach to the expense, replacing the previous tags.
    pub tags: Vec<TagName>,
}

pub fn create_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            occurred_at TEXT,
            import_id TEXT UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_occurred_at ON expense(occurred_at);

        CREATE TABLE IF NOT EXISTS expense_tag (
            expense_id INTEGER NOT NULL REFERENCES expense(id),
            tag_id INTEGER NOT NULL REFERENCES tag(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (expense_id, tag_id)
        );",
    )?;

    Ok(())
}

/// Insert `new_expense` into the database, creating any tags that do not
/// exist yet.
///
/// Duplicate tags on the same expense are stored once, keeping the first
/// occurrence's position.
///
/// # Errors
///
/// This function will return:
/// - [Error::DuplicateImportId] if the import ID already exists in the
///   database,
/// - or an error if there is an SQL error.
pub fn create_expense(new_expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let occurred_at = new_expense
        .occurred_at
        .map(|date_time| date_time.to_offset(UtcOffset::UTC));

    let id: ExpenseId = connection.query_row(
        "INSERT INTO expense (amount, description, occurred_at, import_id)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id;",
        params![
            new_expense.amount,
            new_expense.description,
            occurred_at,
            new_expense.import_id,
        ],
        |row| row.get(0),
    )?;

    let tags = link_tags(id, &new_expense.tags, connection)?;

    Ok(Expense {
        id,
        amount: new_expense.amount,
        description: new_expense.description,
        occurred_at,
        import_id: new_expense.import_id,
        tags,
    })
}

/// Retrieve the expense with the ID `id`.
///
/// # Errors
///
/// This function will return [Error::NotFound] if there is no expense with
/// the ID `id`, or an error if there is an SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, amount, description, occurred_at, import_id
            FROM expense WHERE id = ?1;",
        )?
        .query_row([id], map_expense_row)?;

    with_tags(expense, connection)
}

/// Retrieve one page of expenses.
///
/// Expenses are sorted with the most recent first and expenses without a
/// date last.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn get_expense_page(
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, amount, description, occurred_at, import_id
            FROM expense
            ORDER BY occurred_at IS NULL, occurred_at DESC, id DESC
            LIMIT ?1 OFFSET ?2;",
        )?
        .query_map(params![limit as i64, offset as i64], map_expense_row)?
        .map(|maybe_expense| {
            maybe_expense
                .map_err(Error::from)
                .and_then(|expense| with_tags(expense, connection))
        })
        .collect()
}

/// Retrieve every expense in the database.
///
/// This is used to build the analytics report, which always works from the
/// full data set.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, amount, description, occurred_at, import_id
            FROM expense
            ORDER BY occurred_at IS NULL, occurred_at DESC, id DESC;",
        )?
        .query_map([], map_expense_row)?
        .map(|maybe_expense| {
            maybe_expense
                .map_err(Error::from)
                .and_then(|expense| with_tags(expense, connection))
        })
        .collect()
}

/// Count the expenses in the database.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn count_expenses(connection: &Connection) -> Result<u64, Error> {
    // SQLite integers are i64; COUNT is never negative.
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| {
            row.get::<_, i64>(0).map(|count| count as u64)
        })
        .map_err(Error::from)
}

/// Overwrite the expense with the ID `id` with the fields in `update`,
/// replacing its tags.
///
/// # Errors
///
/// This function will return [Error::UpdateMissingExpense] if there is no
/// expense with the ID `id`, or an error if there is an SQL error.
pub fn update_expense(
    id: ExpenseId,
    update: UpdateExpense,
    connection: &Connection,
) -> Result<(), Error> {
    let occurred_at = update
        .occurred_at
        .map(|date_time| date_time.to_offset(UtcOffset::UTC));

    let rows_affected = connection.execute(
        "UPDATE expense SET amount = ?1, description = ?2, occurred_at = ?3 WHERE id = ?4;",
        params![update.amount, update.description, occurred_at, id],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    connection.execute("DELETE FROM expense_tag WHERE expense_id = ?1;", [id])?;
    link_tags(id, &update.tags, connection)?;

    Ok(())
}

/// Delete the expense with the ID `id` and its tag links.
///
/// # Errors
///
/// This function will return [Error::DeleteMissingExpense] if there is no
/// expense with the ID `id`, or an error if there is an SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM expense_tag WHERE expense_id = ?1;", [id])?;

    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1;", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        occurred_at: row.get(3)?,
        import_id: row.get(4)?,
        tags: Vec::new(),
    })
}

fn with_tags(mut expense: Expense, connection: &Connection) -> Result<Expense, Error> {
    expense.tags = get_expense_tags(expense.id, connection)?;

    Ok(expense)
}

fn get_expense_tags(id: ExpenseId, connection: &Connection) -> Result<Vec<TagName>, Error> {
    connection
        .prepare(
            "SELECT tag.name FROM expense_tag
            JOIN tag ON tag.id = expense_tag.tag_id
            WHERE expense_tag.expense_id = ?1
            ORDER BY expense_tag.position ASC;",
        )?
        .query_map([id], |row| row.get::<_, String>(0))?
        .map(|maybe_name| {
            maybe_name
                .map(|name| TagName::new_unchecked(&name))
                .map_err(Error::from)
        })
        .collect()
}

fn link_tags(
    id: ExpenseId,
    tags: &[TagName],
    connection: &Connection,
) -> Result<Vec<TagName>, Error> {
    let mut linked: Vec<TagName> = Vec::with_capacity(tags.len());

    for name in tags {
        if linked.contains(name) {
            continue;
        }

        let tag = get_or_create_tag(name, connection)?;
        connection.execute(
            "INSERT INTO expense_tag (expense_id, tag_id, position) VALUES (?1, ?2, ?3);",
            params![id, tag.id, linked.len() as i64],
        )?;
        linked.push(name.clone());
    }

    Ok(linked)
}
