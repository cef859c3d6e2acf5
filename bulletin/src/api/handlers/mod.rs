//! HTTP request handlers.
//!
//! - [`auth`]: registration, login and logout
//! - [`posts`]: the public blog plus the editor-only writing routes
//! - [`admin`]: the executive dashboard and account removal
//! - [`badge_pin`]: the stateless badge/PIN check for machine clients
//!
//! Role checks happen in the router (see [`crate::auth::guard`]), not here. A handler behind a
//! guard only runs for callers the guard allowed, and takes the caller through
//! [`Authenticated`](crate::auth::current_user::Authenticated).
//!
//! Views are JSON documents. Handlers that end in a redirect queue their messages through
//! [`Flashes`](crate::api::flash::Flashes).

pub mod admin;
pub mod auth;
pub mod badge_pin;
pub mod posts;
