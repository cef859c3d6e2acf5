//! Store models for posts and comments.

use crate::types::{CommentId, PostId, UserId};
use chrono::{DateTime, Utc};

/// Store request for creating a post
#[derive(Debug, Clone)]
pub struct PostCreateDBRequest {
    pub author_id: UserId,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
}

/// Store request for editing a post. The editor becomes the author.
#[derive(Debug, Clone)]
pub struct PostUpdateDBRequest {
    pub author_id: UserId,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub subtitle: String,
    /// Human readable publication date, e.g. "March 04, 2025"
    pub date: String,
    pub body: String,
    pub img_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentCreateDBRequest {
    pub author_id: UserId,
    pub post_id: PostId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub post_id: PostId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
