//! Test utilities: an in-memory application with cheap hashing.

use std::sync::Arc;

use axum_test::TestServer;

use crate::{
    AppState,
    auth::{password::hash_secret, roles::classify, session::SessionManager},
    config::{AuthConfig, Config, DatabaseConfig, PasswordConfig, SessionConfig},
    db::{
        handlers::{MemoryStore, Store},
        models::users::{Identity, UserCreateDBRequest},
    },
};

/// Display name given to every seeded identity.
pub const TEST_USER_NAME: &str = "Test User";

pub fn create_test_config() -> Config {
    Config {
        database: DatabaseConfig::Memory,
        secret_key: Some("test-secret-key-for-sessions".to_string()),
        auth: AuthConfig {
            allow_registration: true,
            password: PasswordConfig {
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
            },
            session: SessionConfig {
                cookie_secure: false,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State over a fresh in-memory store.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let sessions = SessionManager::new(&config, store.clone()).expect("Failed to create session manager");
    AppState::builder().store(store).sessions(sessions).config(config).build()
}

/// A server over the full router, sharing `state`'s store and sessions.
pub fn create_test_server(state: AppState) -> TestServer {
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Insert an identity directly, with its role classified from `badge`.
pub async fn seed_identity(state: &AppState, email: &str, badge: &str, password: &str, pin: &str) -> Identity {
    let params = state.config.auth.password.argon2_params();
    state
        .store
        .insert(&UserCreateDBRequest {
            email: email.to_string(),
            name: TEST_USER_NAME.to_string(),
            password_hash: hash_secret(password, params).expect("Failed to hash password"),
            badge: badge.to_string(),
            pin_hash: hash_secret(pin, params).expect("Failed to hash PIN"),
            category: classify(Some(badge)),
            company: None,
        })
        .await
        .expect("Failed to seed identity")
}

/// A `Cookie` header value carrying a fresh session for `identity`.
pub async fn session_cookie_for(state: &AppState, identity: &Identity) -> String {
    let token = state.sessions.login(identity).await.expect("Failed to start session");
    format!("{}={token}", state.config.auth.session.cookie_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::RoleTag;

    #[tokio::test]
    async fn test_seeded_identity_is_classified_and_loggable() {
        let state = create_test_state();
        let identity = seed_identity(&state, "exec@example.com", "1234", "pw", "9876").await;
        assert_eq!(identity.category, RoleTag::Executive);

        let cookie = session_cookie_for(&state, &identity).await;
        let token = cookie.split_once('=').unwrap().1;
        assert_eq!(state.sessions.current(token).await.unwrap().map(|i| i.id), Some(identity.id));
    }
}
