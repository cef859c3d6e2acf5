use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        flash::{FlashLevel, Flashes},
        models::{
            auth::{LoginForm, LoginPage, LoginQuery, RegisterConflict, RegisterForm, RegisterPage},
            required,
            users::CurrentUserView,
        },
    },
    auth::{
        accounts::{self, LoginOutcome, RegisterOutcome},
        current_user::CurrentIdentity,
        guard::login_location,
        utils::{expired_cookie, read_cookie, session_cookie},
    },
    errors::{Error, Result},
    types::abbrev_uuid,
};

pub const EMAIL_TAKEN_MESSAGE: &str = "You've already signed up with that email, log in instead!";
pub const BADGE_TAKEN_MESSAGE: &str = "This badge number is already registered. Please use a different badge number.";
pub const REGISTERED_MESSAGE: &str = "Registration successful! Please log in to continue.";
pub const UNKNOWN_EMAIL_MESSAGE: &str = "That email does not exist, please try again.";
pub const WRONG_PASSWORD_MESSAGE: &str = "Password incorrect, please try again.";

fn append_cookie(mut response: Response, cookie: &str) -> Result<Response> {
    let value = HeaderValue::from_str(cookie).map_err(|e| Error::Internal {
        operation: format!("build cookie header: {e}"),
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

/// Registration page
#[utoipa::path(
    get,
    path = "/register",
    tag = "authentication",
    responses(
        (status = 200, description = "Registration page", body = RegisterPage),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register_page(State(state): State<AppState>, CurrentIdentity(identity): CurrentIdentity, flashes: Flashes) -> Response {
    flashes.render(|flashes| RegisterPage {
        current_user: identity.as_ref().map(CurrentUserView::from),
        allow_registration: state.config.auth.allow_registration,
        flashes,
    })
}

/// Register a new account. Never logs the new account in.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    responses(
        (status = 303, description = "Registered, or email already taken; redirects to /login with a flash"),
        (status = 400, description = "Missing field, malformed PIN, or registration disabled"),
        (status = 409, description = "Badge already registered", body = RegisterConflict),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, flashes: Flashes, Form(form): Form<RegisterForm>) -> Result<Response> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let conflict = form.conflict(BADGE_TAKEN_MESSAGE);
    let account = form.into_account()?;

    match accounts::register(state.store.as_ref(), account, state.config.auth.password.argon2_params()).await? {
        RegisterOutcome::Registered(_) => Ok(flashes.push(FlashLevel::Success, REGISTERED_MESSAGE).redirect("/login")),
        RegisterOutcome::EmailTaken => Ok(flashes.push(FlashLevel::Info, EMAIL_TAKEN_MESSAGE).redirect("/login")),
        RegisterOutcome::BadgeTaken => Ok((StatusCode::CONFLICT, Json(conflict)).into_response()),
    }
}

/// Login page
#[utoipa::path(
    get,
    path = "/login",
    tag = "authentication",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login page", body = LoginPage),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_page(CurrentIdentity(identity): CurrentIdentity, Query(query): Query<LoginQuery>, flashes: Flashes) -> Response {
    let next = query.local_next().map(str::to_string);
    flashes.render(|flashes| LoginPage {
        current_user: identity.as_ref().map(CurrentUserView::from),
        next,
        flashes,
    })
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    params(LoginQuery),
    responses(
        (status = 303, description = "Logged in and sent to `next` or `/`; or sent back to /login with a flash"),
        (status = 400, description = "Missing field"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    flashes: Flashes,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = required("email", form.email)?;
    let password = required("password", form.password)?;

    let retry = query.local_next().map_or_else(|| "/login".to_string(), login_location);

    match accounts::login(state.store.as_ref(), email.trim(), &password).await? {
        LoginOutcome::Authenticated(identity) => {
            let token = state.sessions.login(&identity).await?;
            info!(user_id = %abbrev_uuid(&identity.id), "Logged in");
            let response = flashes.redirect(query.local_next().unwrap_or("/"));
            append_cookie(response, &session_cookie(&token, &state.config.auth.session))
        }
        LoginOutcome::UnknownEmail => Ok(flashes.push(FlashLevel::Info, UNKNOWN_EMAIL_MESSAGE).redirect(&retry)),
        LoginOutcome::WrongPassword => Ok(flashes.push(FlashLevel::Info, WRONG_PASSWORD_MESSAGE).redirect(&retry)),
    }
}

/// End the current session
#[utoipa::path(
    get,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 303, description = "Session ended; redirects to /"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let cookie_name = &state.config.auth.session.cookie_name;
    if let Some(token) = read_cookie(&headers, cookie_name) {
        state.sessions.logout(&token).await;
    }
    let response = Flashes::from_headers(&headers).redirect("/");
    append_cookie(response, &expired_cookie(cookie_name))
}
