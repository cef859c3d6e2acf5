//! Authentication and authorization.
//!
//! # Roles
//!
//! Every identity carries a [`roles::RoleTag`] derived from the first character of its badge at
//! registration. Routes declare the [`roles::RoleSet`] they accept and are wrapped with
//! [`guard::require_roles`], which redirects anonymous callers to the login page and answers
//! `403 Forbidden` to callers outside the set.
//!
//! # Credentials
//!
//! Each identity has two independent secrets, a password for the browser login and a 4 to 6 digit
//! PIN for the badge API. Both are stored as Argon2id digests with their own salts; see
//! [`password`].
//!
//! # Sessions
//!
//! A browser login yields a signed token in an HTTP-only cookie. The token is only honoured
//! while its session is registered with the [`session::SessionManager`], so logout and account
//! deletion end it immediately. Handlers get the caller through the extractors in
//! [`current_user`]:
//!
//! ```ignore
//! use bulletin::auth::current_user::Authenticated;
//!
//! async fn handler(Authenticated(identity): Authenticated) -> String {
//!     format!("Hello, {}!", identity.name)
//! }
//! ```
//!
//! The badge API ([`badge_pin`]) never touches sessions.

pub mod accounts;
pub mod badge_pin;
pub mod current_user;
pub mod guard;
pub mod password;
pub mod roles;
pub mod session;
pub mod utils;
