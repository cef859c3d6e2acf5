//! Login sessions.
//!
//! A session is a signed JWT (`sub`, `jti`, `iat`, `exp`) held in a cookie, plus an entry for its
//! `jti` in a TTL registry. A token is only honoured while its `jti` is live, so logout and
//! account deletion take effect immediately even though the token itself is still validly signed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    config::Config,
    db::{
        handlers::Store,
        models::users::Identity,
    },
    errors::Error,
    types::{UserId, abbrev_uuid},
};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId, // Subject (identity ID)
    pub jti: Uuid,   // Session ID, checked against the registry
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    timeout: Duration,
    /// Live sessions: jti -> owner
    live: Cache<Uuid, UserId>,
    store: Arc<dyn Store>,
}

impl SessionManager {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Result<Self, Error> {
        let secret_key = config
            .secret_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Internal {
                operation: "create session manager: secret_key is required".to_string(),
            })?;
        let timeout = config.auth.session.timeout;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(secret_key.as_bytes()),
            timeout,
            live: Cache::builder().time_to_live(timeout).build(),
            store,
        })
    }

    /// Start a session for `identity` and return its token.
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&identity.id)), err)]
    pub async fn login(&self, identity: &Identity) -> Result<String, Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: identity.id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: now.timestamp() + self.timeout.as_secs() as i64,
        };

        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })?;
        self.live.insert(claims.jti, identity.id).await;
        Ok(token)
    }

    /// End the session behind `token`. Unknown or invalid tokens are ignored.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) {
        match self.decode(token) {
            Ok(Some(claims)) => self.live.invalidate(&claims.jti).await,
            Ok(None) => {}
            Err(e) => debug!("Ignoring undecodable token on logout: {e}"),
        }
    }

    /// The identity behind `token`, if the token is valid, its session is live and the identity
    /// still exists.
    #[instrument(skip_all, err)]
    pub async fn current(&self, token: &str) -> Result<Option<Identity>, Error> {
        let Some(claims) = self.decode(token)? else {
            return Ok(None);
        };

        match self.live.get(&claims.jti).await {
            Some(owner) if owner == claims.sub => {}
            _ => {
                debug!(user_id = %abbrev_uuid(&claims.sub), "Session is not live");
                return Ok(None);
            }
        }

        let identity = self.store.find_by_id(claims.sub).await?;
        if identity.is_none() {
            self.live.invalidate(&claims.jti).await;
        }
        Ok(identity)
    }

    /// End every live session owned by `user_id`. Returns how many were ended.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)))]
    pub async fn revoke_all(&self, user_id: UserId) -> usize {
        let owned: Vec<Uuid> = self
            .live
            .iter()
            .filter(|(_, owner)| *owner == user_id)
            .map(|(jti, _)| *jti)
            .collect();

        for jti in &owned {
            self.live.invalidate(jti).await;
        }
        owned.len()
    }

    /// Verify signature and expiry. Tokens that are merely bad yield `None`; key problems are errors.
    fn decode(&self, token: &str) -> Result<Option<SessionClaims>, Error> {
        match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Ok(Some(data.claims)),
            Err(e) => match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => {
                    debug!("Rejected session token: {e}");
                    Ok(None)
                }
                _ => Err(Error::Internal {
                    operation: format!("JWT verification: {e}"),
                }),
            },
        }
    }
}
