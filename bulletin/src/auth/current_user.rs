//! Extractors for the identity behind the session cookie.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    auth::utils::read_cookie,
    db::models::users::Identity,
    errors::{Error, Result},
};

/// Resolve the session cookie in `headers`, if any, to a live identity.
#[instrument(skip_all)]
pub async fn identity_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Option<Identity>> {
    let Some(token) = read_cookie(headers, &state.config.auth.session.cookie_name) else {
        trace!("No session cookie");
        return Ok(None);
    };
    state.sessions.current(&token).await
}

/// The caller's identity, or `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Self(Some(identity.clone())));
        }
        Ok(Self(identity_from_headers(state, &parts.headers).await?))
    }
}

/// The caller's identity; anonymous callers are rejected with 401.
///
/// Behind [`require_roles`](crate::auth::guard::require_roles) the guard has already resolved the
/// identity and this just picks it up.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match CurrentIdentity::from_request_parts(parts, state).await? {
            CurrentIdentity(Some(identity)) => Ok(Self(identity)),
            CurrentIdentity(None) => Err(Error::Unauthenticated { message: None }),
        }
    }
}
