//! Implements the state shared by the REST server's handlers.
//!
//! The state is constructed explicitly at process start and passed into the
//! router; nothing is built at import time. Each group of handlers extracts
//! the narrow sub-state it needs via [FromRef].

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    auth::TokenKeys,
    db::initialize,
    media::{ObjectStorage, UploadConfig},
};

/// The state of the REST server.
///
/// Generic over the object storage backend so the upload pipeline can be
/// exercised with a test double.
#[derive(Clone)]
pub struct AppState<S: ObjectStorage> {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing and verifying bearer tokens.
    pub token_keys: TokenKeys,
    /// How long issued tokens stay valid, in seconds.
    pub token_lifetime: u64,
    /// The rules applied to image uploads.
    pub upload_config: UploadConfig,
    /// The external storage uploads are sent to.
    pub object_storage: S,
}

impl<S: ObjectStorage> AppState<S> {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        token_lifetime: u64,
        upload_config: UploadConfig,
        object_storage: S,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: TokenKeys::new(jwt_secret),
            token_lifetime,
            upload_config,
            object_storage,
        })
    }
}

/// The state needed by handlers that only query the database.
#[derive(Clone)]
pub struct DbState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl<S: ObjectStorage> FromRef<AppState<S>> for DbState {
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed to verify a bearer token and resolve its principal.
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying presented tokens.
    pub decoding_key: DecodingKey,
}

impl<S: ObjectStorage> FromRef<AppState<S>> for AuthState {
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            decoding_key: state.token_keys.decoding.clone(),
        }
    }
}

/// The state needed to sign in a user and issue a token.
#[derive(Clone)]
pub struct SessionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key for signing new tokens.
    pub encoding_key: EncodingKey,
    /// How long issued tokens stay valid, in seconds.
    pub token_lifetime: u64,
}

impl<S: ObjectStorage> FromRef<AppState<S>> for SessionState {
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            encoding_key: state.token_keys.encoding.clone(),
            token_lifetime: state.token_lifetime,
        }
    }
}

/// The state needed by the image upload pipeline.
#[derive(Clone)]
pub struct MediaState<S: ObjectStorage> {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The external storage uploads are sent to.
    pub object_storage: S,
    /// The rules applied to image uploads.
    pub upload_config: UploadConfig,
}

impl<S: ObjectStorage> FromRef<AppState<S>> for MediaState<S> {
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            object_storage: state.object_storage.clone(),
            upload_config: state.upload_config,
        }
    }
}
