//! Defines the account model, its database queries and the account routes.

use axum::{Json, extract::State};
use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{DatabaseId, Error, UserId, auth::Claims, state::DbState};

/// A financial account owned by a user, e.g. a checking account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: DatabaseId,
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub account_name: String,
    /// The current balance of the account.
    pub balance: f64,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// The public identifier of the account, e.g. `account_1`.
    pub slug: String,
}

/// The data needed to insert a new [Account].
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub account_name: String,
    /// The opening balance of the account.
    pub balance: f64,
}

/// Create the table for storing accounts.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_accounts_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_name TEXT NOT NULL,
                balance REAL NOT NULL,
                created TEXT NOT NULL,
                slug TEXT UNIQUE
                )",
        (),
    )?;

    Ok(())
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        account_name: row.get(2)?,
        balance: row.get(3)?,
        created: row.get(4)?,
        slug: row.get(5)?,
    })
}

/// Insert a new account and assign its slug.
///
/// The insert and the slug assignment run in a single SQLite transaction, as
/// for transactions and users.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn insert_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let tx = connection.unchecked_transaction()?;
    let created = OffsetDateTime::now_utc();

    tx.execute(
        "INSERT INTO accounts (user_id, account_name, balance, created) VALUES (?1, ?2, ?3, ?4)",
        (
            new_account.user_id.as_i64(),
            &new_account.account_name,
            new_account.balance,
            created,
        ),
    )?;

    let id = tx.last_insert_rowid();
    let slug = format!("account_{id}");

    tx.execute("UPDATE accounts SET slug = ?1 WHERE id = ?2", (&slug, id))?;
    tx.commit()?;

    Ok(Account {
        id,
        user_id: new_account.user_id,
        account_name: new_account.account_name,
        balance: new_account.balance,
        created,
        slug,
    })
}

/// List accounts in insertion order, optionally restricted to one owner.
///
/// The `owner` filter is applied mechanically; deciding whether to set it
/// based on the requesting principal is the caller's job.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_accounts(
    owner: Option<UserId>,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    const SELECT_ACCOUNT: &str =
        "SELECT id, user_id, account_name, balance, created, slug FROM accounts";

    match owner {
        Some(user_id) => connection
            .prepare(&format!(
                "{SELECT_ACCOUNT} WHERE user_id = :user_id ORDER BY id"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], map_account_row)?
            .map(|maybe_account| maybe_account.map_err(Error::SqlError))
            .collect(),
        None => connection
            .prepare(&format!("{SELECT_ACCOUNT} ORDER BY id"))?
            .query_map([], map_account_row)?
            .map(|maybe_account| maybe_account.map_err(Error::SqlError))
            .collect(),
    }
}

/// Route handler for listing accounts.
///
/// Non-admin principals see only their own accounts; admins see all of them.
pub async fn get_accounts(
    State(state): State<DbState>,
    claims: Claims,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    list_accounts(claims.ownership_filter(), &connection).map(Json)
}
