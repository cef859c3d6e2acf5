//! In-memory store.
//!
//! Mirrors the Postgres schema's constraints: unique email, badge and post title, and cascading
//! deletes from identities to posts and comments and from posts to comments. All tables sit
//! behind one lock, so each operation is atomic.

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Identities, Posts},
    models::{
        posts::{Comment, CommentCreateDBRequest, Post, PostCreateDBRequest, PostUpdateDBRequest},
        users::{Identity, UserCreateDBRequest},
    },
};
use crate::types::{PostId, UserId, abbrev_uuid};

#[derive(Default)]
struct Tables {
    users: Vec<Identity>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(table: &str, constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

fn foreign_key_violation(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("insert on table \"{table}\" violates foreign key constraint \"{constraint}\""),
    }
}

#[async_trait::async_trait]
impl Identities for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_badge(&self, badge: &str) -> Result<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.badge == badge).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    #[instrument(skip(self, request), fields(badge = %request.badge), err)]
    async fn insert(&self, request: &UserCreateDBRequest) -> Result<Identity> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == request.email) {
            return Err(unique_violation("users", "users_email_key"));
        }
        if tables.users.iter().any(|u| u.badge == request.badge) {
            return Err(unique_violation("users", "users_badge_key"));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            name: request.name.clone(),
            password_hash: request.password_hash.clone(),
            badge: request.badge.clone(),
            pin_hash: request.pin_hash.clone(),
            category: request.category,
            company: request.company.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(identity.clone());
        Ok(identity)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        let Tables { posts, comments, .. } = &mut *tables;
        let removed_posts: Vec<PostId> = posts.iter().filter(|p| p.author_id == id).map(|p| p.id).collect();
        posts.retain(|p| p.author_id != id);
        comments.retain(|c| c.author_id != id && !removed_posts.contains(&c.post_id));
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.users.clone())
    }
}

#[async_trait::async_trait]
impl Posts for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.clone())
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create_post(&self, request: &PostCreateDBRequest) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == request.author_id) {
            return Err(foreign_key_violation("blog_posts", "blog_posts_author_id_fkey"));
        }
        if tables.posts.iter().any(|p| p.title == request.title) {
            return Err(unique_violation("blog_posts", "blog_posts_title_key"));
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id: request.author_id,
            title: request.title.clone(),
            subtitle: request.subtitle.clone(),
            date: request.date.clone(),
            body: request.body.clone(),
            img_url: request.img_url.clone(),
            created_at: Utc::now(),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update_post(&self, id: PostId, request: &PostUpdateDBRequest) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.id != id && p.title == request.title) {
            return Err(unique_violation("blog_posts", "blog_posts_title_key"));
        }

        let post = tables.posts.iter_mut().find(|p| p.id == id).ok_or(DbError::NotFound)?;
        post.author_id = request.author_id;
        post.title = request.title.clone();
        post.subtitle = request.subtitle.clone();
        post.body = request.body.clone();
        post.img_url = request.img_url.clone();
        Ok(post.clone())
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete_post(&self, id: PostId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().filter(|c| c.post_id == post_id).cloned().collect())
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&request.post_id)), err)]
    async fn create_comment(&self, request: &CommentCreateDBRequest) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == request.post_id) {
            return Err(foreign_key_violation("comments", "comments_post_id_fkey"));
        }
        if !tables.users.iter().any(|u| u.id == request.author_id) {
            return Err(foreign_key_violation("comments", "comments_author_id_fkey"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            author_id: request.author_id,
            post_id: request.post_id,
            text: request.text.clone(),
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }
}
