//! API response models for identities.

use super::posts::PostView;
use crate::api::flash::Flash;
use crate::auth::roles::RoleTag;
use crate::db::models::users::Identity;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An identity as shown to executives. Digests are never included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityView {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub badge: String,
    pub category: RoleTag,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityView {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            badge: identity.badge,
            category: identity.category,
            company: identity.company,
            created_at: identity.created_at,
        }
    }
}

/// The logged-in caller, attached to every page view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserView {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub category: RoleTag,
}

impl From<&Identity> for CurrentUserView {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            category: identity.category,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardPage {
    pub current_user: CurrentUserView,
    /// In registration order
    pub users: Vec<IdentityView>,
    /// Newest first
    pub posts: Vec<PostView>,
    pub flashes: Vec<Flash>,
}
