//! Role-gated route protection.
//!
//! [`authorize`] is the decision procedure; [`require_roles`] applies it in front of a router
//! via `axum::middleware::from_fn_with_state`:
//!
//! ```ignore
//! Router::new()
//!     .route("/new-post", post(create_post))
//!     .route_layer(from_fn_with_state(Guard::new(state.clone(), RoleSet::EDITORS), require_roles))
//! ```
//!
//! The handler never runs unless the decision is [`Decision::Allow`].

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::flash::{FlashLevel, Flashes},
    auth::{
        current_user::identity_from_headers,
        roles::{RoleSet, RoleTag},
    },
    db::models::users::Identity,
    errors::Error,
};

/// Flash shown when an anonymous caller hits a guarded page.
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be logged in to view this page.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Not logged in; `target` is the path and query that was requested.
    RedirectToLogin { target: String },
    /// Logged in, but the role is not in the required set.
    Forbidden,
}

pub fn authorize(identity: Option<&Identity>, required: RoleSet, target: &str) -> Decision {
    match identity {
        None => Decision::RedirectToLogin {
            target: target.to_string(),
        },
        Some(identity) if !required.contains(identity.category) => Decision::Forbidden,
        Some(_) => Decision::Allow,
    }
}

/// `/login?next=<target>`, with the target form-urlencoded.
pub fn login_location(target: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/login?next={next}")
}

/// Middleware state: the roles a router requires.
#[derive(Clone)]
pub struct Guard {
    app: AppState,
    roles: RoleSet,
    login_message: &'static str,
}

impl Guard {
    pub fn new(app: AppState, roles: RoleSet) -> Self {
        Self {
            app,
            roles,
            login_message: LOGIN_REQUIRED_MESSAGE,
        }
    }

    /// Replace the flash shown to anonymous callers.
    pub fn with_login_message(mut self, message: &'static str) -> Self {
        self.login_message = message;
        self
    }
}

#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path(), required = %guard.roles))]
pub async fn require_roles(State(guard): State<Guard>, mut request: Request, next: Next) -> Response {
    let identity = match identity_from_headers(&guard.app, request.headers()).await {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| request.uri().clone());
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    match authorize(identity.as_ref(), guard.roles, target) {
        Decision::Allow => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Decision::RedirectToLogin { target } => {
            debug!("Anonymous caller redirected to login");
            Flashes::from_headers(request.headers())
                .push(FlashLevel::Warning, guard.login_message)
                .redirect(&login_location(&target))
        }
        Decision::Forbidden => Error::Forbidden {
            required: guard.roles,
            role: identity.map_or(RoleTag::Unknown, |identity| identity.category),
        }
        .into_response(),
    }
}
