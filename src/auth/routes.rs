//! Route handlers for registration, login and the current user.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{
    Error, FieldErrors, PasswordHash,
    state::{DbState, SessionState},
    user::{NewUser, User, get_user_by_id, get_user_by_username, insert_user},
};

use super::{Claims, encode_token};

/// The minimum number of characters accepted for a new password.
const MIN_PASSWORD_LENGTH: usize = 8;

/// The registration request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    /// The unique name the user will sign in with.
    pub username: String,
    /// The email address to associate with the user.
    pub email: String,
    /// The plaintext password; hashed before storage, never persisted.
    pub password: String,
}

/// The login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    /// The name the user signs in with.
    pub username: String,
    /// The plaintext password to compare against the stored hash.
    pub password: String,
}

/// The login response: the user, a signed bearer token and its lifetime in
/// seconds.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The authenticated user, without the password hash.
    pub user: User,
    /// The signed bearer token.
    pub token: String,
    /// How long the token stays valid, in seconds.
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

fn validate_registration(data: &RegisterData) -> Result<EmailAddress, Error> {
    let mut fields = FieldErrors::new();

    if data.username.is_empty() {
        fields.push("username", "username must not be empty");
    }

    if data.password.chars().count() < MIN_PASSWORD_LENGTH {
        fields.push(
            "password",
            format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }

    match data.email.parse::<EmailAddress>() {
        Ok(email) => {
            fields.into_result()?;
            Ok(email)
        }
        Err(_) => {
            fields.push("email", "email is invalid");
            Err(Error::Validation(fields))
        }
    }
}

/// Route handler for registering a new user.
///
/// New users never hold the admin role. The response omits the password
/// hash.
pub async fn post_register(
    State(state): State<DbState>,
    payload: Result<Json<RegisterData>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Error> {
    let Json(data) = payload.map_err(|_| Error::MalformedRequest)?;

    let email = validate_registration(&data)?;
    let password = PasswordHash::new(&data.password, PasswordHash::DEFAULT_COST)?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let user = insert_user(
        NewUser {
            username: data.username,
            email,
            password,
            admin: false,
        },
        &connection,
    )
    .map_err(|error| match error {
        Error::DuplicateUsername => {
            let mut fields = FieldErrors::new();
            fields.push("username", "the username is already taken");
            Error::Validation(fields)
        }
        error => error,
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Route handler for signing in.
///
/// # Errors
///
/// Responds 401 with the same body whether the username is unknown or the
/// password comparison fails, so a caller cannot probe for registered
/// usernames.
pub async fn post_login(
    State(state): State<SessionState>,
    payload: Result<Json<LoginData>, JsonRejection>,
) -> Result<Json<LoginResponse>, Error> {
    let Json(data) = payload.map_err(|_| Error::MalformedRequest)?;

    let user = {
        let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

        get_user_by_username(&data.username, &connection).map_err(|error| match error {
            Error::NotFound(_) => Error::InvalidCredentials,
            error => error,
        })?
    };

    let password_is_correct = user.password.verify(&data.password).map_err(|error| {
        tracing::error!("Error verifying password: {}", error);
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(&user, state.token_lifetime, &state.encoding_key)?;

    Ok(Json(LoginResponse {
        user,
        token,
        expires_in: state.token_lifetime,
    }))
}

/// Route handler for the currently authenticated user.
pub async fn get_me(State(state): State<DbState>, claims: Claims) -> Result<Json<User>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_user_by_id(claims.id, &connection).map(Json)
}
