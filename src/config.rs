//! Process-wide configuration loaded once at start-up.
//!
//! Nothing in this crate reads the environment at request time: the server
//! binary builds a [Config] during start-up and threads the values through
//! [AppState](crate::AppState).

use std::{env, time::Duration};

/// The token lifetime used when `TOKEN_LIFETIME` is not set.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 3600;

/// The request timeout for uploads to external object storage.
pub const DEFAULT_MEDIA_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced while reading configuration from the environment.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("the environment variable '{0}' must be set")]
    MissingVariable(&'static str),

    /// An environment variable was set but could not be parsed.
    #[error("the environment variable '{0}' could not be parsed: {1}")]
    InvalidVariable(&'static str, String),
}

/// The process-wide configuration for the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    /// How long issued tokens stay valid, in seconds.
    pub token_lifetime: u64,
    /// The unsigned-upload endpoint of the external object storage service.
    pub media_storage_url: String,
    /// The unsigned-upload preset sent along with each upload.
    pub media_upload_preset: String,
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [ConfigError] if `JWT_SECRET`, `MEDIA_STORAGE_URL` or
    /// `MEDIA_UPLOAD_PRESET` is missing, or if `TOKEN_LIFETIME` is set but
    /// not a positive integer. The server binary treats any of these as
    /// fatal at start-up.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value. Factored out of [Config::from_env] so the parsing rules
    /// can be tested without mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingVariable("JWT_SECRET"))?;

        let token_lifetime = match lookup("TOKEN_LIFETIME") {
            Some(raw) => raw
                .parse()
                .map_err(|error| ConfigError::InvalidVariable("TOKEN_LIFETIME", format!("{error}")))?,
            None => DEFAULT_TOKEN_LIFETIME_SECONDS,
        };

        let media_storage_url = lookup("MEDIA_STORAGE_URL")
            .ok_or(ConfigError::MissingVariable("MEDIA_STORAGE_URL"))?;
        let media_upload_preset = lookup("MEDIA_UPLOAD_PRESET")
            .ok_or(ConfigError::MissingVariable("MEDIA_UPLOAD_PRESET"))?;

        Ok(Self {
            jwt_secret,
            token_lifetime,
            media_storage_url,
            media_upload_preset,
        })
    }
}
