//! Persistence for identities, posts and comments.
//!
//! # Modules
//!
//! - [`handlers`]: Store traits and their Postgres and in-memory backends
//! - [`models`]: Records as handed to and returned from the store
//! - [`errors`]: Store error types
//!
//! # Migrations
//!
//! Postgres migrations live in the `migrations/` directory and are applied on startup through
//! [`crate::migrator`]:
//!
//! ```ignore
//! bulletin::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
