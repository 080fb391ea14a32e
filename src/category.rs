//! Defines the category reference data and its routes.

use axum::{Json, extract::Path, extract::State};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::{DatabaseId, Error, state::DbState};

/// A transaction category, e.g. groceries or rent.
///
/// Categories are static reference data: the service reads them but offers
/// no endpoints to change them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The display name of the category.
    pub name: String,
    /// The public identifier of the category.
    pub slug: String,
}

/// Create the table for storing categories.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_categories_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

/// Insert a category with the given `name` and `slug`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error, e.g. a duplicate slug.
pub fn insert_category(name: &str, slug: &str, connection: &Connection) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
        (name, slug),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        slug: slug.to_owned(),
    })
}

/// List all categories in insertion order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, slug FROM categories ORDER BY id")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::SqlError))
        .collect()
}

/// Get the category with the given `slug`.
///
/// # Errors
/// Returns [Error::NotFound] if no such category exists, or
/// [Error::SqlError] for SQL errors.
pub fn get_category_by_slug(slug: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, slug FROM categories WHERE slug = :slug")?
        .query_row(&[(":slug", &slug)], map_category_row)
        .optional()?
        .ok_or(Error::NotFound("Category"))
}

/// Route handler for listing all categories.
pub async fn get_categories(State(state): State<DbState>) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    list_categories(&connection).map(Json)
}

/// Route handler for getting a category by its slug.
pub async fn get_category(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_category_by_slug(&slug, &connection).map(Json)
}
