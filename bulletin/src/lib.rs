//! # bulletin: role-gated publishing
//!
//! `bulletin` is a small publishing service. Anyone may read posts, any logged-in identity may
//! comment, executives and directors write, and executives administer. Roles are not assigned by
//! an administrator: each identity's role is derived from the first digit of its badge number
//! when it registers.
//!
//! ## Overview
//!
//! Identities authenticate in one of two ways. Browsers log in with email and password and
//! receive a session cookie. Machine clients such as door readers and kiosks call
//! `POST /api/authenticate_badge_pin` with a badge and PIN. That call never creates a session and
//! only answers whether the pair is valid and who it belongs to. Passwords and PINs are separate
//! secrets, each stored as its own Argon2id digest.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum). Persistence goes
//! through the store traits in [`db::handlers`], backed either by PostgreSQL (with embedded
//! migrations) or by a process-local in-memory store.
//!
//! ### Request Flow
//!
//! Every route is registered in [`build_router`] inside a group that names the roles it accepts.
//! Each group is wrapped with [`auth::guard::require_roles`], which resolves the session cookie
//! before the handler runs. Anonymous callers are redirected to `/login?next=<target>`. Callers
//! whose role is outside the group's set get `403 Forbidden`. Handlers therefore contain no role
//! checks of their own.
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): handlers, forms and JSON views, flash messages
//! - **Authentication layer** ([`auth`]): role classification, hashing, sessions, the guard
//! - **Database layer** ([`db`]): store traits with Postgres and in-memory backends
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use bulletin::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = bulletin::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     bulletin::telemetry::init_telemetry(&config.telemetry)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers::{admin, auth as auth_handlers, badge_pin, posts},
    auth::{
        guard::{Guard, require_roles},
        roles::RoleSet,
        session::SessionManager,
    },
    config::{CorsOrigin, DatabaseConfig},
    db::handlers::{MemoryStore, PgStore, Store},
    openapi::ApiDoc,
};
use axum::http::HeaderValue;
use axum::{
    Router, http,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{CommentId, PostId, UserId};

/// Flash shown when an anonymous caller tries to comment.
pub const COMMENT_LOGIN_MESSAGE: &str = "You need to login or register to comment.";

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(store.clone())
///     .sessions(SessionManager::new(&config, store)?)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionManager,
    pub config: Config,
}

/// Get the bulletin database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect the configured store. For Postgres, migrations run before the store is returned.
#[instrument(skip_all)]
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Memory => {
            warn!("Using the in-memory store: all identities, posts and comments are lost on shutdown");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        DatabaseConfig::Postgres { url, pool } => {
            info!("Using external database");
            let pg = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(pool.acquire_timeout)
                .connect(url)
                .await?;
            migrator().run(&pg).await?;
            Ok((Arc::new(PgStore::new(pg.clone())), Some(pg)))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.origin().ascii_serialization().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// Routes are grouped by the roles they require; every group except the public one sits behind
/// [`require_roles`]. The comment route accepts any role but has its own login message.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let guard = |roles: RoleSet| from_fn_with_state(Guard::new(state.clone(), roles), require_roles);

    let commenters = from_fn_with_state(
        Guard::new(state.clone(), RoleSet::ANY).with_login_message(COMMENT_LOGIN_MESSAGE),
        require_roles,
    );

    let public = Router::new()
        .route("/", get(posts::list_posts))
        .route(
            "/post/{id}",
            get(posts::get_post).merge(post(posts::add_comment).route_layer(commenters)),
        )
        .route("/register", get(auth_handlers::register_page).post(auth_handlers::register))
        .route("/login", get(auth_handlers::login_page).post(auth_handlers::login))
        .route("/logout", get(auth_handlers::logout))
        .route("/api/authenticate_badge_pin", post(badge_pin::authenticate));

    let editors = Router::new()
        .route("/new-post", get(posts::new_post_page).post(posts::create_post))
        .route("/edit-post/{id}", get(posts::edit_post_page).post(posts::update_post))
        .route_layer(guard(RoleSet::EDITORS));

    let executives = Router::new()
        .route("/delete/{id}", get(posts::delete_post_page).post(posts::delete_post))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/delete_user/{id}", post(admin::delete_user))
        .route_layer(guard(RoleSet::EXECUTIVES));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(public)
        .merge(editors)
        .merge(executives)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?);

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The HTTP server and the resources it owns.
///
/// 1. **Create**: [`Application::new`] connects the store and runs migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, connections are closed and telemetry flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with its configured store
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(
            host = %config.host,
            port = config.port,
            memory_store = config.database.is_memory(),
            allow_registration = config.auth.allow_registration,
            "Starting bulletin"
        );
        let (store, pool) = setup_store(&config).await?;
        let mut app = Self::new_with_store(config, store)?;
        app.pool = pool;
        Ok(app)
    }

    /// Create an application around an existing store
    pub fn new_with_store(config: Config, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let sessions = SessionManager::new(&config, store.clone())?;
        let app_state = AppState::builder().store(store).sessions(sessions).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            config,
            pool: None,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Bulletin listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
