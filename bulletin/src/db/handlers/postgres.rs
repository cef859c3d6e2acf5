//! Postgres store.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::roles::RoleTag;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Identities, Posts},
    models::{
        posts::{Comment, CommentCreateDBRequest, Post, PostCreateDBRequest, PostUpdateDBRequest},
        users::{Identity, UserCreateDBRequest},
    },
};
use crate::types::{CommentId, PostId, UserId, abbrev_uuid};

// Database entity models
#[derive(Debug, FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    name: String,
    password_hash: String,
    badge: String,
    pin_hash: String,
    category: RoleTag,
    company: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            badge: row.badge,
            pin_hash: row.pin_hash,
            category: row.category,
            company: row.company,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: PostId,
    author_id: UserId,
    title: String,
    subtitle: String,
    date: String,
    body: String,
    img_url: String,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            subtitle: row.subtitle,
            date: row.date,
            body: row.body,
            img_url: row.img_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: CommentId,
    author_id: UserId,
    post_id: PostId,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            post_id: row.post_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, name, password_hash, badge, pin_hash, category, company, created_at";
const POST_COLUMNS: &str = "id, author_id, title, subtitle, date, body, img_url, created_at";
const COMMENT_COLUMNS: &str = "id, author_id, post_id, text, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Identities for PgStore {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Identity::from))
    }

    #[instrument(skip(self), err)]
    async fn find_by_badge(&self, badge: &str) -> Result<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE badge = $1"))
            .bind(badge)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Identity::from))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Identity::from))
    }

    #[instrument(skip(self, request), fields(badge = %request.badge), err)]
    async fn insert(&self, request: &UserCreateDBRequest) -> Result<Identity> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, badge, pin_hash, category, company)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.password_hash)
        .bind(&request.badge)
        .bind(&request.pin_hash)
        .bind(request.category)
        .bind(&request.company)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: UserId) -> Result<bool> {
        // Posts and comments go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Identity>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Identity::from).collect())
    }
}

#[async_trait::async_trait]
impl Posts for PgStore {
    #[instrument(skip(self), err)]
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create_post(&self, request: &PostCreateDBRequest) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO blog_posts (id, author_id, title, subtitle, date, body, img_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.author_id)
        .bind(&request.title)
        .bind(&request.subtitle)
        .bind(&request.date)
        .bind(&request.body)
        .bind(&request.img_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update_post(&self, id: PostId, request: &PostUpdateDBRequest) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE blog_posts
            SET author_id = $2, title = $3, subtitle = $4, body = $5, img_url = $6
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.author_id)
        .bind(&request.title)
        .bind(&request.subtitle)
        .bind(&request.body)
        .bind(&request.img_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete_post(&self, id: PostId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&post_id)), err)]
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at, id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&request.post_id)), err)]
    async fn create_comment(&self, request: &CommentCreateDBRequest) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (id, author_id, post_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.author_id)
        .bind(request.post_id)
        .bind(&request.text)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
