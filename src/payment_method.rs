//! Defines the payment method reference data and its routes.

use axum::{Json, extract::Path, extract::State};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::{DatabaseId, Error, state::DbState};

/// A way of paying for a transaction, e.g. cash or a debit card.
///
/// Payment methods are static reference data: the service reads them but
/// offers no endpoints to change them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethod {
    /// The ID of the payment method.
    pub id: DatabaseId,
    /// The display name of the payment method.
    pub name: String,
    /// The public identifier of the payment method.
    pub slug: String,
}

/// Create the table for storing payment methods.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_payment_methods_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment_methods (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_payment_method_row(row: &Row) -> Result<PaymentMethod, rusqlite::Error> {
    Ok(PaymentMethod {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

/// Insert a payment method with the given `name` and `slug`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error, e.g. a duplicate slug.
pub fn insert_payment_method(
    name: &str,
    slug: &str,
    connection: &Connection,
) -> Result<PaymentMethod, Error> {
    connection.execute(
        "INSERT INTO payment_methods (name, slug) VALUES (?1, ?2)",
        (name, slug),
    )?;

    Ok(PaymentMethod {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        slug: slug.to_owned(),
    })
}

/// List all payment methods in insertion order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_payment_methods(connection: &Connection) -> Result<Vec<PaymentMethod>, Error> {
    connection
        .prepare("SELECT id, name, slug FROM payment_methods ORDER BY id")?
        .query_map([], map_payment_method_row)?
        .map(|maybe_method| maybe_method.map_err(Error::SqlError))
        .collect()
}

/// Get the payment method with the given `slug`.
///
/// # Errors
/// Returns [Error::NotFound] if no such payment method exists, or
/// [Error::SqlError] for SQL errors.
pub fn get_payment_method_by_slug(
    slug: &str,
    connection: &Connection,
) -> Result<PaymentMethod, Error> {
    connection
        .prepare("SELECT id, name, slug FROM payment_methods WHERE slug = :slug")?
        .query_row(&[(":slug", &slug)], map_payment_method_row)
        .optional()?
        .ok_or(Error::NotFound("Payment method"))
}

/// Route handler for listing all payment methods.
pub async fn get_payment_methods(
    State(state): State<DbState>,
) -> Result<Json<Vec<PaymentMethod>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    list_payment_methods(&connection).map(Json)
}

/// Route handler for getting a payment method by its slug.
pub async fn get_payment_method(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<PaymentMethod>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_payment_method_by_slug(&slug, &connection).map(Json)
}
