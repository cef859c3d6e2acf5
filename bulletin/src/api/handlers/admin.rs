use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use crate::{
    AppState,
    api::{
        flash::{FlashLevel, Flashes},
        handlers::posts::post_views,
        models::users::{CurrentUserView, DashboardPage, IdentityView},
    },
    auth::current_user::Authenticated,
    errors::{Error, Result},
    types::{UserId, abbrev_uuid},
};

pub const DASHBOARD: &str = "/admin/dashboard";
pub const SELF_DELETE_MESSAGE: &str = "You cannot delete your own account from the dashboard.";

/// All identities and posts
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    responses(
        (status = 200, description = "Dashboard", body = DashboardPage),
        (status = 403, description = "Caller is not an executive"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>, Authenticated(identity): Authenticated, flashes: Flashes) -> Result<Response> {
    let users = state.store.list().await?.into_iter().map(IdentityView::from).collect();

    let mut posts = state.store.list_posts().await?;
    posts.reverse();
    let posts = post_views(state.store.as_ref(), posts).await?;

    Ok(flashes.render(|flashes| DashboardPage {
        current_user: CurrentUserView::from(&identity),
        users,
        posts,
        flashes,
    }))
}

/// Delete an identity, its posts and comments, and end its sessions
#[utoipa::path(
    post,
    path = "/admin/delete_user/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Identity ID")),
    responses(
        (status = 303, description = "Redirects to the dashboard with a flash"),
        (status = 403, description = "Caller is not an executive"),
        (status = 404, description = "No such identity"),
    )
)]
#[tracing::instrument(skip_all, fields(caller = %abbrev_uuid(&identity.id), target = %abbrev_uuid(&id)))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Authenticated(identity): Authenticated,
    flashes: Flashes,
) -> Result<Response> {
    if id == identity.id {
        return Ok(flashes.push(FlashLevel::Danger, SELF_DELETE_MESSAGE).redirect(DASHBOARD));
    }

    let target = state.store.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    state.store.delete(id).await?;
    let revoked = state.sessions.revoke_all(id).await;
    info!(revoked, "Identity deleted");

    Ok(flashes
        .push(FlashLevel::Success, format!("User '{}' has been deleted successfully.", target.name))
        .redirect(DASHBOARD))
}
