//! Defines the core data model, validation rules and database queries for
//! transactions.

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{DatabaseId, Error, FieldErrors, UserId};

/// The longest slug accepted by lookups. Longer slugs are rejected before
/// any query runs.
pub const MAX_SLUG_LENGTH: usize = 100;

/// The largest amount of money a single transaction may move.
const MAX_AMOUNT: f64 = 1_000_000.0;

/// The accepted range for description lengths, in characters.
const MIN_DESCRIPTION_LENGTH: usize = 3;
const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// How many rows the latest-transactions listing returns.
const LATEST_COUNT: u64 = 10;

/// An expense or income recorded against an account.
///
/// The slug (`transaction_<id>`) is the transaction's identity for all
/// external operations; the numeric ID never leaves the service contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The account the money moved in or out of.
    pub account_id: DatabaseId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    /// How the transaction was paid.
    pub payment_method_id: DatabaseId,
    /// Whether the transaction is an expense or an income.
    pub transaction_type: String,
    /// The category name the transaction belongs to.
    pub category: String,
    /// The amount of money moved.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The public identifier of the transaction, e.g. `transaction_1`.
    pub slug: String,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

/// The mutable fields of a transaction, as accepted by the create and update
/// endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionData {
    /// The account the money moved in or out of.
    pub account_id: DatabaseId,
    /// The user recording the transaction.
    pub user_id: UserId,
    /// How the transaction was paid.
    pub payment_method_id: DatabaseId,
    /// Whether the transaction is an expense or an income.
    pub transaction_type: String,
    /// The category name the transaction belongs to.
    pub category: String,
    /// The amount of money moved.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
}

/// Check the range and length rules for `data`, field by field.
///
/// Returns the accumulated per-field messages; an empty set means the data
/// passed. Reference checks against the database are separate, see
/// [check_references].
pub fn validate_transaction(data: &TransactionData) -> FieldErrors {
    let mut fields = FieldErrors::new();

    if data.transaction_type.is_empty() {
        fields.push("transaction_type", "transaction_type must be filled out");
    }

    if data.category.is_empty() {
        fields.push("category", "category must be filled out");
    }

    if data.amount <= 0.0 {
        fields.push("amount", "the amount has to be over 0 $");
    } else if data.amount > MAX_AMOUNT {
        fields.push("amount", "the amount has to be under 1000000 $");
    }

    let description_length = data.description.chars().count();
    if description_length < MIN_DESCRIPTION_LENGTH {
        fields.push("description", "description must be at least 3 letters");
    } else if description_length > MAX_DESCRIPTION_LENGTH {
        fields.push("description", "description must be at most 1024 letters");
    }

    fields
}

/// Check that the three reference fields of `data` point at existing rows,
/// appending a message per missing reference to `fields`.
///
/// # Errors
/// Returns [Error::SqlError] if an existence query itself fails.
pub fn check_references(
    data: &TransactionData,
    fields: &mut FieldErrors,
    connection: &Connection,
) -> Result<(), Error> {
    if !row_exists("accounts", data.account_id, connection)? {
        fields.push("account_id", "account_id does not refer to an existing account");
    }

    if !row_exists("users", data.user_id.as_i64(), connection)? {
        fields.push("user_id", "user_id does not refer to an existing user");
    }

    if !row_exists("payment_methods", data.payment_method_id, connection)? {
        fields.push(
            "payment_method_id",
            "payment_method_id does not refer to an existing payment method",
        );
    }

    Ok(())
}

fn row_exists(table: &str, id: DatabaseId, connection: &Connection) -> Result<bool, Error> {
    // `table` is always one of the fixed names above, never request data.
    connection
        .query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
            [id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Create the table for storing transactions.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transactions_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                payment_method_id INTEGER NOT NULL,
                transaction_type TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                slug TEXT UNIQUE,
                created TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into a [Transaction].
///
/// **Note:** This function expects the row to contain all the table columns
/// in the order they were defined.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        user_id: UserId::new(row.get(2)?),
        payment_method_id: row.get(3)?,
        transaction_type: row.get(4)?,
        category: row.get(5)?,
        amount: row.get(6)?,
        description: row.get(7)?,
        slug: row.get(8)?,
        created: row.get(9)?,
    })
}

const SELECT_TRANSACTION: &str = "SELECT id, account_id, user_id, payment_method_id, \
     transaction_type, category, amount, description, slug, created FROM transactions";

/// Insert a validated transaction and assign its slug.
///
/// The insert and the slug assignment (`transaction_<id>`, derived from the
/// fresh row ID) run in a single SQLite transaction: no other connection can
/// observe the row without its slug, and a retry of the slug write cannot
/// duplicate the insert.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    data: &TransactionData,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let tx = connection.unchecked_transaction()?;
    let created = OffsetDateTime::now_utc();

    tx.execute(
        "INSERT INTO transactions
             (account_id, user_id, payment_method_id, transaction_type, category, amount, description, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            data.account_id,
            data.user_id.as_i64(),
            data.payment_method_id,
            &data.transaction_type,
            &data.category,
            data.amount,
            &data.description,
            created,
        ),
    )?;

    let id = tx.last_insert_rowid();
    let slug = format!("transaction_{id}");

    tx.execute(
        "UPDATE transactions SET slug = ?1 WHERE id = ?2",
        (&slug, id),
    )?;
    tx.commit()?;

    Ok(Transaction {
        id,
        account_id: data.account_id,
        user_id: data.user_id,
        payment_method_id: data.payment_method_id,
        transaction_type: data.transaction_type.clone(),
        category: data.category.clone(),
        amount: data.amount,
        description: data.description.clone(),
        slug,
        created,
    })
}

/// Defines how transactions should be fetched from [list_transactions].
///
/// The filters are applied mechanically; deciding whether to restrict the
/// listing to one owner is the caller's job, which keeps these queries
/// reusable independent of authentication.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TransactionQuery {
    /// Include only transactions recorded by this user.
    pub user_id: Option<UserId>,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: u64,
    /// Skips the first `offset` transactions.
    pub offset: u64,
}

/// Retrieve a page of transactions in insertion order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut query_string_parts = vec![SELECT_TRANSACTION.to_string()];
    let mut query_parameters = vec![];

    if let Some(user_id) = query.user_id {
        query_string_parts.push(format!("WHERE user_id = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(user_id.as_i64()));
    }

    query_string_parts.push("ORDER BY id".to_string());
    query_string_parts.push(format!("LIMIT {} OFFSET {}", query.limit, query.offset));

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect()
}

/// Count the transactions matching the `user_id` filter; `None` counts every
/// row.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    user_id: Option<UserId>,
    connection: &Connection,
) -> Result<u64, Error> {
    match user_id {
        Some(user_id) => connection
            .query_row(
                "SELECT COUNT(id) FROM transactions WHERE user_id = ?1",
                [user_id.as_i64()],
                |row| row.get::<_, i64>(0).map(|n| n as u64),
            )
            .map_err(Error::from),
        None => connection
            .query_row("SELECT COUNT(id) FROM transactions", [], |row| {
                row.get::<_, i64>(0).map(|n| n as u64)
            })
            .map_err(Error::from),
    }
}

/// Retrieve the newest transactions (by descending ID), at most ten,
/// matching the `user_id` filter.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn latest_transactions(
    user_id: Option<UserId>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    match user_id {
        Some(user_id) => connection
            .prepare(&format!(
                "{SELECT_TRANSACTION} WHERE user_id = ?1 ORDER BY id DESC LIMIT {LATEST_COUNT}"
            ))?
            .query_map([user_id.as_i64()], map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect(),
        None => connection
            .prepare(&format!(
                "{SELECT_TRANSACTION} ORDER BY id DESC LIMIT {LATEST_COUNT}"
            ))?
            .query_map([], map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect(),
    }
}

/// Retrieve the transaction with the given `slug`.
///
/// # Errors
/// Returns [Error::NotFound] if no such transaction exists, or
/// [Error::SqlError] for SQL errors.
pub fn get_transaction_by_slug(
    slug: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE slug = :slug"))?
        .query_row(&[(":slug", &slug)], map_transaction_row)
        .optional()?
        .ok_or(Error::NotFound("Transaction"))
}

/// Replace the mutable fields of the transaction with the given `slug`.
///
/// The slug and ID are identity and never change.
///
/// # Errors
/// Returns [Error::NotFound] if no such transaction exists, or
/// [Error::SqlError] for SQL errors.
pub fn update_transaction_by_slug(
    slug: &str,
    data: &TransactionData,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "UPDATE transactions
                 SET account_id = ?1, user_id = ?2, payment_method_id = ?3,
                     transaction_type = ?4, category = ?5, amount = ?6, description = ?7
                 WHERE slug = ?8
                 RETURNING id, account_id, user_id, payment_method_id, transaction_type,
                           category, amount, description, slug, created",
        )?
        .query_row(
            (
                data.account_id,
                data.user_id.as_i64(),
                data.payment_method_id,
                &data.transaction_type,
                &data.category,
                data.amount,
                &data.description,
                slug,
            ),
            map_transaction_row,
        )
        .optional()?
        .ok_or(Error::NotFound("Transaction"))
}

/// Hard-delete the transaction with the given `slug`.
///
/// # Errors
/// Returns [Error::NotFound] if no such transaction exists, or
/// [Error::SqlError] for SQL errors.
pub fn delete_transaction_by_slug(slug: &str, connection: &Connection) -> Result<(), Error> {
    let deleted = connection.execute("DELETE FROM transactions WHERE slug = ?1", [slug])?;

    if deleted == 0 {
        return Err(Error::NotFound("Transaction"));
    }

    Ok(())
}
