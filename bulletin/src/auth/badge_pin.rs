//! Badge and PIN verification for machine clients.
//!
//! Stateless: no session is read or created. The store is not consulted when either input is
//! missing, and no hash is computed for an unknown badge.

use tracing::{debug, instrument};

use crate::{
    auth::password::verify_secret_blocking,
    db::{handlers::Identities, models::users::Identity},
    errors::Result,
};

#[derive(Debug)]
pub enum BadgePinOutcome {
    Authenticated(Identity),
    MissingInput,
    BadgeNotFound,
    InvalidPin,
}

#[instrument(skip_all, err)]
pub async fn authenticate_badge_pin<S>(store: &S, badge: Option<&str>, pin: Option<&str>) -> Result<BadgePinOutcome>
where
    S: Identities + ?Sized,
{
    let (Some(badge), Some(pin)) = (badge.filter(|b| !b.is_empty()), pin.filter(|p| !p.is_empty())) else {
        return Ok(BadgePinOutcome::MissingInput);
    };

    let Some(identity) = store.find_by_badge(badge).await? else {
        debug!("Unknown badge");
        return Ok(BadgePinOutcome::BadgeNotFound);
    };

    if verify_secret_blocking(pin.to_string(), identity.pin_hash.clone()).await? {
        Ok(BadgePinOutcome::Authenticated(identity))
    } else {
        Ok(BadgePinOutcome::InvalidPin)
    }
}
