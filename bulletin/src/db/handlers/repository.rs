//! Store traits.
//!
//! The service only ever talks to its store through these traits, so the Postgres backend and
//! the in-memory backend are interchangeable. Every operation is atomic on its own; unique
//! constraints are enforced by the backend and reported as [`DbError::UniqueViolation`].
//!
//! [`DbError::UniqueViolation`]: crate::db::errors::DbError::UniqueViolation

use crate::db::errors::Result;
use crate::db::models::{
    posts::{Comment, CommentCreateDBRequest, Post, PostCreateDBRequest, PostUpdateDBRequest},
    users::{Identity, UserCreateDBRequest},
};
use crate::types::{PostId, UserId};

/// Registered identities.
#[async_trait::async_trait]
pub trait Identities: Send + Sync {
    /// Look up by email (exact, case-sensitive match)
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Look up by badge (exact match)
    async fn find_by_badge(&self, badge: &str) -> Result<Option<Identity>>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>>;

    /// Insert a new identity. Fails with a unique violation if the email or badge is taken.
    async fn insert(&self, request: &UserCreateDBRequest) -> Result<Identity>;

    /// Delete an identity together with its posts and comments.
    async fn delete(&self, id: UserId) -> Result<bool>;

    /// All identities in registration order
    async fn list(&self) -> Result<Vec<Identity>>;
}

/// Posts and their comments.
#[async_trait::async_trait]
pub trait Posts: Send + Sync {
    /// All posts, oldest first
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>>;

    async fn create_post(&self, request: &PostCreateDBRequest) -> Result<Post>;

    /// Replace a post's content. Fails with `NotFound` if it does not exist.
    async fn update_post(&self, id: PostId, request: &PostUpdateDBRequest) -> Result<Post>;

    /// Delete a post together with its comments
    async fn delete_post(&self, id: PostId) -> Result<bool>;

    /// Comments on a post, oldest first
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>>;

    async fn create_comment(&self, request: &CommentCreateDBRequest) -> Result<Comment>;
}

/// A complete backend.
pub trait Store: Identities + Posts {}

impl<T: Identities + Posts> Store for T {}
