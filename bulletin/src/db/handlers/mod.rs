//! Store backends.
//!
//! - [`PgStore`]: PostgreSQL via SQLx, schema from `migrations/`
//! - [`MemoryStore`]: process-local tables, used in tests and for quick local runs
//!
//! Both implement the traits in [`repository`] and are used as `Arc<dyn Store>`.

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{Identities, Posts, Store};
