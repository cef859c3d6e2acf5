//! Store models for registered identities.

use crate::auth::roles::RoleTag;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use std::fmt;

/// Store request for creating a new identity.
///
/// Both secrets must already be hashed.
#[derive(Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub badge: String,
    pub pin_hash: String,
    pub category: RoleTag,
    pub company: Option<String>,
}

/// A registered identity as stored.
#[derive(Clone, PartialEq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub badge: String,
    pub pin_hash: String,
    /// Role decided from the badge at registration; never recomputed.
    pub category: RoleTag,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("badge", &self.badge)
            .field("category", &self.category)
            .field("company", &self.company)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for UserCreateDBRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCreateDBRequest")
            .field("email", &self.email)
            .field("badge", &self.badge)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}
