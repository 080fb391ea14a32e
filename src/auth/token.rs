//! Issuing and verifying the signed tokens that carry a principal.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, UserId, user::User};

/// The contents of a bearer token: the principal it authenticates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the authenticated user.
    pub id: UserId,
    /// The username of the authenticated user.
    pub username: String,
    /// Whether the authenticated user holds the admin role.
    pub admin: bool,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The owner filter a listing should be restricted to for this
    /// principal: `None` for admins (full visibility), the principal's own
    /// ID otherwise.
    pub fn ownership_filter(&self) -> Option<UserId> {
        (!self.admin).then_some(self.id)
    }
}

/// The signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    /// The key for signing new tokens.
    pub encoding: EncodingKey,
    /// The key for verifying presented tokens.
    pub decoding: DecodingKey,
}

impl TokenKeys {
    /// Derive both keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// Issue a signed token for `user` that expires `lifetime` seconds from now.
///
/// # Errors
/// Returns [Error::TokenCreation] if signing fails.
pub fn encode_token(user: &User, lifetime: u64, encoding_key: &EncodingKey) -> Result<String, Error> {
    let exp = OffsetDateTime::now_utc().unix_timestamp() as usize + lifetime as usize;
    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        admin: user.admin,
        exp,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("could not sign token: {}", error);
        Error::TokenCreation
    })
}

/// Verify `token` and return the principal it carries.
///
/// Expiry is checked with zero leeway: a token is rejected the moment its
/// `exp` passes.
///
/// # Errors
/// Returns [Error::InvalidToken] if the signature is invalid, the token is
/// malformed or it has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| Error::InvalidToken)
}
