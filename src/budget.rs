//! Defines the budget reference data and its routes.

use axum::{Json, extract::Path, extract::State};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{DatabaseId, Error, UserId, state::DbState};

/// A monthly spending limit a user has set for a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseId,
    /// The user the budget belongs to.
    pub user_id: UserId,
    /// The category name the limit applies to.
    pub category: String,
    /// The spending ceiling for a calendar month.
    pub monthly_limit: f64,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// The public identifier of the budget, e.g. `budget_1`.
    pub slug: String,
}

/// The data needed to insert a new [Budget].
#[derive(Debug, Clone)]
pub struct NewBudget {
    /// The user the budget belongs to.
    pub user_id: UserId,
    /// The category name the limit applies to.
    pub category: String,
    /// The spending ceiling for a calendar month.
    pub monthly_limit: f64,
}

/// Create the table for storing budgets.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_budgets_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                monthly_limit REAL NOT NULL,
                created TEXT NOT NULL,
                slug TEXT UNIQUE
                )",
        (),
    )?;

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        category: row.get(2)?,
        monthly_limit: row.get(3)?,
        created: row.get(4)?,
        slug: row.get(5)?,
    })
}

const SELECT_BUDGET: &str =
    "SELECT id, user_id, category, monthly_limit, created, slug FROM budgets";

/// Insert a new budget and assign its slug.
///
/// The insert and the slug assignment run in a single SQLite transaction, as
/// for transactions and users.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn insert_budget(new_budget: NewBudget, connection: &Connection) -> Result<Budget, Error> {
    let tx = connection.unchecked_transaction()?;
    let created = OffsetDateTime::now_utc();

    tx.execute(
        "INSERT INTO budgets (user_id, category, monthly_limit, created) VALUES (?1, ?2, ?3, ?4)",
        (
            new_budget.user_id.as_i64(),
            &new_budget.category,
            new_budget.monthly_limit,
            created,
        ),
    )?;

    let id = tx.last_insert_rowid();
    let slug = format!("budget_{id}");

    tx.execute("UPDATE budgets SET slug = ?1 WHERE id = ?2", (&slug, id))?;
    tx.commit()?;

    Ok(Budget {
        id,
        user_id: new_budget.user_id,
        category: new_budget.category,
        monthly_limit: new_budget.monthly_limit,
        created,
        slug,
    })
}

/// List all budgets in insertion order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_budgets(connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!("{SELECT_BUDGET} ORDER BY id"))?
        .query_map([], map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::SqlError))
        .collect()
}

/// Get the budget with the given `slug`.
///
/// # Errors
/// Returns [Error::NotFound] if no such budget exists, or [Error::SqlError]
/// for SQL errors.
pub fn get_budget_by_slug(slug: &str, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!("{SELECT_BUDGET} WHERE slug = :slug"))?
        .query_row(&[(":slug", &slug)], map_budget_row)
        .optional()?
        .ok_or(Error::NotFound("Budget"))
}

/// Route handler for listing all budgets.
pub async fn get_budgets(State(state): State<DbState>) -> Result<Json<Vec<Budget>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    list_budgets(&connection).map(Json)
}

/// Route handler for getting a budget by its slug.
pub async fn get_budget(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<Budget>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_budget_by_slug(&slug, &connection).map(Json)
}

#[cfg(test)]
mod budget_tests {
    use rusqlite::Connection;

    use crate::{Error, UserId};

    use super::{NewBudget, create_budgets_table, get_budget_by_slug, insert_budget, list_budgets};

    fn init_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_budgets_table(&conn).unwrap();
        conn
    }

    fn new_budget(category: &str, monthly_limit: f64) -> NewBudget {
        NewBudget {
            user_id: UserId::new(1),
            category: category.to_owned(),
            monthly_limit,
        }
    }

    #[test]
    fn insert_budget_assigns_slug() {
        let conn = init_db();

        let budget = insert_budget(new_budget("matur", 80_000.0), &conn).unwrap();

        assert_eq!(budget.slug, format!("budget_{}", budget.id));
    }

    #[test]
    fn get_budget_by_slug_returns_inserted_budget() {
        let conn = init_db();

        let inserted = insert_budget(new_budget("matur", 80_000.0), &conn).unwrap();
        let retrieved = get_budget_by_slug(&inserted.slug, &conn).unwrap();

        assert_eq!(inserted, retrieved);
    }

    #[test]
    fn get_budget_fails_with_unknown_slug() {
        let conn = init_db();

        assert_eq!(
            get_budget_by_slug("budget_42", &conn),
            Err(Error::NotFound("Budget"))
        );
    }

    #[test]
    fn list_budgets_returns_insertion_order() {
        let conn = init_db();

        let first = insert_budget(new_budget("matur", 80_000.0), &conn).unwrap();
        let second = insert_budget(new_budget("samgöngur", 25_000.0), &conn).unwrap();

        assert_eq!(list_budgets(&conn).unwrap(), vec![first, second]);
    }
}
