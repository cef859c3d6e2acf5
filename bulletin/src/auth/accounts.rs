//! Registration and password login.
//!
//! Both flows return an outcome enum rather than an HTTP response; the handlers in
//! [`crate::api::handlers::auth`] decide how each outcome is presented.

use std::fmt;

use tracing::{info, instrument};

use crate::{
    auth::{
        password::{Argon2Params, hash_secret_blocking, validate_pin, verify_secret_blocking},
        roles::classify,
    },
    db::{
        handlers::Identities,
        models::users::{Identity, UserCreateDBRequest},
    },
    errors::Result,
    types::abbrev_uuid,
};

/// Everything a new account is created from. Secrets are in plain text here and hashed before
/// they reach the store.
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub badge: String,
    pub pin: String,
    pub company: Option<String>,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("badge", &self.badge)
            .field("company", &self.company)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum RegisterOutcome {
    Registered(Identity),
    EmailTaken,
    BadgeTaken,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(Identity),
    UnknownEmail,
    WrongPassword,
}

/// Create an account.
///
/// Email and badge are checked before anything is hashed, then the PIN format. The store's unique
/// constraints have the final word, so a concurrent duplicate ends in the same outcome as one
/// caught by the pre-checks.
#[instrument(skip_all, fields(badge = %account.badge), err)]
pub async fn register<S>(store: &S, account: NewAccount, params: Argon2Params) -> Result<RegisterOutcome>
where
    S: Identities + ?Sized,
{
    if store.find_by_email(&account.email).await?.is_some() {
        return Ok(RegisterOutcome::EmailTaken);
    }
    if store.find_by_badge(&account.badge).await?.is_some() {
        return Ok(RegisterOutcome::BadgeTaken);
    }
    validate_pin(&account.pin)?;

    let password_hash = hash_secret_blocking(account.password, params).await?;
    let pin_hash = hash_secret_blocking(account.pin, params).await?;
    let category = classify(Some(&account.badge));

    let request = UserCreateDBRequest {
        email: account.email,
        name: account.name,
        password_hash,
        badge: account.badge,
        pin_hash,
        category,
        company: account.company,
    };

    match store.insert(&request).await {
        Ok(identity) => {
            info!(user_id = %abbrev_uuid(&identity.id), category = %identity.category, "Registered new identity");
            Ok(RegisterOutcome::Registered(identity))
        }
        Err(e) if e.is_unique_violation_on("email") => Ok(RegisterOutcome::EmailTaken),
        Err(e) if e.is_unique_violation_on("badge") => Ok(RegisterOutcome::BadgeTaken),
        Err(e) => Err(e.into()),
    }
}

/// Check an email and password pair.
#[instrument(skip_all, err)]
pub async fn login<S>(store: &S, email: &str, password: &str) -> Result<LoginOutcome>
where
    S: Identities + ?Sized,
{
    let Some(identity) = store.find_by_email(email).await? else {
        return Ok(LoginOutcome::UnknownEmail);
    };

    if verify_secret_blocking(password.to_string(), identity.password_hash.clone()).await? {
        Ok(LoginOutcome::Authenticated(identity))
    } else {
        Ok(LoginOutcome::WrongPassword)
    }
}
