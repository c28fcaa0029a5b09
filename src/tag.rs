//! The `Tag` type, tag queries and the tags page.
//!
//! A tag is used for categorising and grouping expenses. Tags are created
//! implicitly when an expense that mentions them is saved, and the tags page
//! lists every tag along with how many expenses use it.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, endpoints,
    html::{PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base},
    navigation::NavBar,
};

/// The name of a tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TagName(String);

impl TagName {
    /// Create a tag name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyTagName] if `name` is an
    /// empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyTagName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a tag name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TagName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagName::new(s)
    }
}

impl Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type TagId = i64;

/// A tag for grouping expenses, e.g., 'groceries', 'transport'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Tag {
    /// The ID of the tag.
    pub id: TagId,

    /// The name of the tag.
    pub name: TagName,
}

/// A tag along with the number of expenses that use it.
#[derive(Debug, Clone, PartialEq)]
pub struct TagUsage {
    /// The tag.
    pub tag: Tag,
    /// How many expenses reference the tag.
    pub expense_count: i64,
}

pub fn create_tag_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS tag (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_tag_name ON tag(name);",
    )?;

    Ok(())
}

/// Get the tag named `name`, creating it first if it does not exist.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn get_or_create_tag(name: &TagName, connection: &Connection) -> Result<Tag, Error> {
    let existing = connection
        .prepare("SELECT id, name FROM tag WHERE name = :name;")?
        .query_row(&[(":name", &name.as_ref())], map_row);

    match existing {
        Ok(tag) => Ok(tag),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            connection.execute("INSERT INTO tag (name) VALUES (?1);", (name.as_ref(),))?;

            Ok(Tag {
                id: connection.last_insert_rowid(),
                name: name.clone(),
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Retrieve all tags in the database, sorted by name.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn get_all_tags(connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare("SELECT id, name FROM tag ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all tags along with the number of expenses using each, sorted by
/// name.
///
/// Tags that no expense references are included with a count of zero.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn get_tags_with_usage(connection: &Connection) -> Result<Vec<TagUsage>, Error> {
    connection
        .prepare(
            "SELECT tag.id, tag.name, COUNT(expense_tag.expense_id)
            FROM tag
            LEFT JOIN expense_tag ON expense_tag.tag_id = tag.id
            GROUP BY tag.id
            ORDER BY tag.name ASC;",
        )?
        .query_map([], |row| {
            let tag = map_row(row)?;
            let expense_count = row.get(2)?;

            Ok(TagUsage { tag, expense_count })
        })?
        .map(|maybe_usage| maybe_usage.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Tag, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = TagName::new_unchecked(&raw_name);

    Ok(Tag { id, name })
}

/// The state needed to render the tags page.
#[derive(Debug, Clone)]
pub struct TagsPageState {
    /// The database connection holding tags and expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TagsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the tags page, listing every tag and its usage count.
pub async fn get_tags_page(State(state): State<TagsPageState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let tags = match get_tags_with_usage(&connection) {
        Ok(tags) => tags,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let nav_bar = NavBar::new(endpoints::TAGS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Tags" }

            @if tags.is_empty()
            {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "No tags yet. Tags are created when you save an expense with tags."
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Tag" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                            }
                        }

                        tbody
                        {
                            @for usage in &tags
                            {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (usage.tag.name) }
                                    td class=(TABLE_CELL_STYLE) { (usage.expense_count) }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    let page = base("Tags", &[], &content);

    (StatusCode::OK, Html(page.into_string())).into_response()
}
