//! OpenAPI documentation, served with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;
use crate::auth::roles::RoleTag;

/// Documents the session cookie. The cookie name here is the default; deployments may rename it.
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "SessionCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "bulletin_session",
                    "Set by `POST /login`, cleared by `GET /logout`.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bulletin",
        description = "Role-gated publishing. Roles come from the first digit of an identity's badge: \
                       executives and directors write, executives administer, everyone may read and comment."
    ),
    paths(
        api::handlers::posts::list_posts,
        api::handlers::posts::get_post,
        api::handlers::posts::add_comment,
        api::handlers::posts::new_post_page,
        api::handlers::posts::create_post,
        api::handlers::posts::edit_post_page,
        api::handlers::posts::update_post,
        api::handlers::posts::delete_post_page,
        api::handlers::posts::delete_post,
        api::handlers::admin::dashboard,
        api::handlers::admin::delete_user,
        api::handlers::auth::register_page,
        api::handlers::auth::register,
        api::handlers::auth::login_page,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::badge_pin::authenticate,
    ),
    components(schemas(
        RoleTag,
        api::flash::Flash,
        api::flash::FlashLevel,
        api::models::posts::PostForm,
        api::models::posts::CommentForm,
        api::models::posts::PostView,
        api::models::posts::CommentView,
        api::models::posts::IndexPage,
        api::models::posts::PostPage,
        api::models::posts::EditPostPage,
        api::models::posts::NewPostPage,
        api::models::posts::DeletePostPage,
        api::models::users::IdentityView,
        api::models::users::CurrentUserView,
        api::models::users::DashboardPage,
        api::models::auth::RegisterForm,
        api::models::auth::RegisterConflict,
        api::models::auth::LoginForm,
        api::models::auth::LoginPage,
        api::models::auth::RegisterPage,
        api::models::auth::BadgePinRequest,
        api::models::auth::BadgePinStatus,
        api::models::auth::BadgePinResponse,
    )),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "posts", description = "Reading, writing and commenting on posts"),
        (name = "admin", description = "Executive-only administration"),
        (name = "authentication", description = "Registration and browser sessions"),
        (name = "badge", description = "Stateless badge and PIN verification"),
    )
)]
pub struct ApiDoc;
