//! Defines the user model, its database queries and the user reference
//! routes.

use axum::{Json, extract::Path, extract::State};
use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, PasswordHash, UserId, state::DbState};

/// A user of the application.
///
/// The password hash is kept on the model for credential checks but is never
/// serialized into responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The unique name the user signs in with.
    pub username: String,
    /// The email address associated with the user.
    pub email: EmailAddress,
    /// The user's salted and hashed password.
    #[serde(skip_serializing)]
    pub password: PasswordHash,
    /// Whether the user holds the admin role.
    pub admin: bool,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// The public identifier of the user, e.g. `user_1`.
    pub slug: String,
}

/// The data needed to insert a new [User].
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The unique name the user signs in with.
    pub username: String,
    /// The email address associated with the user.
    pub email: EmailAddress,
    /// The user's salted and hashed password.
    pub password: PasswordHash,
    /// Whether the user holds the admin role.
    pub admin: bool,
}

/// Create the table for storing users.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_users_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                admin INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                slug TEXT UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into a [User].
///
/// **Note:** This function expects the row to contain all the table columns
/// in the order they were defined.
pub fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(2)?;
    let raw_password: String = row.get(3)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        username: row.get(1)?,
        email: EmailAddress::new_unchecked(raw_email),
        password: PasswordHash::new_unchecked(&raw_password),
        admin: row.get(4)?,
        created: row.get(5)?,
        slug: row.get(6)?,
    })
}

const SELECT_USER: &str = "SELECT id, username, email, password, admin, created, slug FROM users";

/// Insert a new user and assign its slug.
///
/// The insert and the slug assignment run in a single SQLite transaction, so
/// a row without a slug is never visible to other connections and a retry
/// cannot insert the user twice.
///
/// # Errors
/// Returns [Error::DuplicateUsername] if the username is already in use, or
/// [Error::SqlError] for any other SQL error.
pub fn insert_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let tx = connection.unchecked_transaction()?;
    let created = OffsetDateTime::now_utc();

    tx.execute(
        "INSERT INTO users (username, email, password, admin, created) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &new_user.username,
            new_user.email.to_string(),
            new_user.password.to_string(),
            new_user.admin,
            created,
        ),
    )?;

    let id = tx.last_insert_rowid();
    let slug = format!("user_{id}");

    tx.execute("UPDATE users SET slug = ?1 WHERE id = ?2", (&slug, id))?;
    tx.commit()?;

    Ok(User {
        id: UserId::new(id),
        username: new_user.username,
        email: new_user.email,
        password: new_user.password,
        admin: new_user.admin,
        created,
        slug,
    })
}

/// Get the user with the given `id`.
///
/// # Errors
/// Returns [Error::NotFound] if no such user exists, or [Error::SqlError]
/// for SQL errors.
pub fn get_user_by_id(id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &id.as_i64())], map_user_row)
        .optional()?
        .ok_or(Error::NotFound("User"))
}

/// Get the user with the given `username`.
///
/// # Errors
/// Returns [Error::NotFound] if no such user exists, or [Error::SqlError]
/// for SQL errors.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE username = :username"))?
        .query_row(&[(":username", &username)], map_user_row)
        .optional()?
        .ok_or(Error::NotFound("User"))
}

/// Get the user with the given `slug`.
///
/// # Errors
/// Returns [Error::NotFound] if no such user exists, or [Error::SqlError]
/// for SQL errors.
pub fn get_user_by_slug(slug: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE slug = :slug"))?
        .query_row(&[(":slug", &slug)], map_user_row)
        .optional()?
        .ok_or(Error::NotFound("User"))
}

/// List all users in insertion order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(&format!("{SELECT_USER} ORDER BY id"))?
        .query_map([], map_user_row)?
        .map(|maybe_user| maybe_user.map_err(Error::SqlError))
        .collect()
}

/// Route handler for listing all users.
///
/// Password hashes are omitted by the [User] serialization.
pub async fn get_users(State(state): State<DbState>) -> Result<Json<Vec<User>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    list_users(&connection).map(Json)
}

/// Route handler for getting a user by its slug.
pub async fn get_user(
    State(state): State<DbState>,
    Path(slug): Path<String>,
) -> Result<Json<User>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_user_by_slug(&slug, &connection).map(Json)
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{Error, PasswordHash, test_utils::new_test_user};

    use super::{
        create_users_table, get_user_by_id, get_user_by_slug, get_user_by_username, insert_user,
        list_users,
    };

    fn init_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_users_table(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_user_assigns_id_and_slug() {
        let conn = init_db();

        let user = insert_user(new_test_user("alda", false), &conn).unwrap();

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.slug, format!("user_{}", user.id.as_i64()));
    }

    #[test]
    fn insert_user_fails_on_duplicate_username() {
        let conn = init_db();

        insert_user(new_test_user("alda", false), &conn).unwrap();
        let duplicate = insert_user(new_test_user("alda", false), &conn);

        assert_eq!(duplicate, Err(Error::DuplicateUsername));
    }

    #[test]
    fn get_user_by_id_returns_inserted_user() {
        let conn = init_db();

        let inserted = insert_user(new_test_user("alda", false), &conn).unwrap();
        let retrieved = get_user_by_id(inserted.id, &conn).unwrap();

        assert_eq!(inserted, retrieved);
    }

    #[test]
    fn get_user_by_username_returns_inserted_user() {
        let conn = init_db();

        let inserted = insert_user(new_test_user("alda", false), &conn).unwrap();
        let retrieved = get_user_by_username("alda", &conn).unwrap();

        assert_eq!(inserted, retrieved);
    }

    #[test]
    fn get_user_by_slug_fails_with_unknown_slug() {
        let conn = init_db();

        assert_eq!(
            get_user_by_slug("user_42", &conn),
            Err(Error::NotFound("User"))
        );
    }

    #[test]
    fn list_users_returns_users_in_insertion_order() {
        let conn = init_db();

        let first = insert_user(new_test_user("alda", false), &conn).unwrap();
        let second = insert_user(new_test_user("birta", true), &conn).unwrap();

        assert_eq!(list_users(&conn).unwrap(), vec![first, second]);
    }

    #[test]
    fn user_serialization_omits_password() {
        let conn = init_db();

        let mut new_user = new_test_user("alda", false);
        new_user.password = PasswordHash::new_unchecked("$2b$12$notarealhash");
        let user = insert_user(new_user, &conn).unwrap();

        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alda");
        assert_eq!(json["slug"], format!("user_{}", user.id.as_i64()));
    }
}
