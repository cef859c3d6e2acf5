//! Store record structures.

pub mod posts;
pub mod users;
