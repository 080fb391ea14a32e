//! Resolves the principal of a request from its `Authorization` header.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{Error, state::AuthState};

use super::{Claims, decode_token};

/// Pull the bearer token out of a header map.
///
/// The typed `Authorization` accessor is tried first; if it does not produce
/// a token, the raw header map is scanned with a case-insensitive key
/// comparison and the value split on the first space. Some request
/// representations only surface headers as plain key/value pairs (e.g. a
/// non-canonical `bearer` scheme), which only the fallback accepts, so the
/// priority order matters.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_owned());
    }

    headers
        .iter()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("authorization"))
        .and_then(|(_, value)| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .map(|(_, token)| token.to_owned())
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(Error::MissingAuthHeader)?;

        decode_token(&token, &auth_state.decoding_key)
    }
}

/// The principal of an admin-gated route.
///
/// Extraction re-runs authentication and additionally requires the admin
/// role; a valid non-admin token is rejected with 401 "Insufficient
/// authorization" (401 rather than 403, for compatibility with existing
/// clients).
#[derive(Debug, Clone, PartialEq)]
pub struct AdminClaims(pub Claims);

impl<S> FromRequestParts<S> for AdminClaims
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;

        if !claims.admin {
            return Err(Error::InsufficientAuthorization);
        }

        Ok(AdminClaims(claims))
    }
}
