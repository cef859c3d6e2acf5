//! API request/response models for posts and comments.

use super::{required, users::CurrentUserView};
use crate::api::flash::Flash;
use crate::db::models::posts::{Comment, Post};
use crate::errors::{Error, Result};
use crate::types::{CommentId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Body of `POST /new-post` and `POST /edit-post/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// Absolute http(s) URL of the header image
    pub img_url: String,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

impl PostForm {
    pub fn validate(self) -> Result<ValidPost> {
        let title = required("title", self.title)?;
        let subtitle = required("subtitle", self.subtitle)?;
        let body = required("body", self.body)?;
        let img_url = required("img_url", self.img_url)?;

        match Url::parse(img_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            _ => {
                return Err(Error::BadRequest {
                    message: "img_url must be an absolute http(s) URL".to_string(),
                });
            }
        }

        Ok(ValidPost {
            title,
            subtitle,
            body,
            img_url: img_url.trim().to_string(),
        })
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            body: post.body.clone(),
            img_url: post.img_url.clone(),
        }
    }
}

/// Body of `POST /post/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostView {
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
}

impl PostView {
    pub fn new(post: Post, author_name: Option<String>) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            author_name,
            title: post.title,
            subtitle: post.subtitle,
            date: post.date,
            body: post.body,
            img_url: post.img_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentView {
    #[schema(value_type = String, format = "uuid")]
    pub id: CommentId,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: Comment, author_name: Option<String>) -> Self {
        Self {
            id: comment.id,
            author_id: comment.author_id,
            author_name,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexPage {
    pub current_user: Option<CurrentUserView>,
    pub posts: Vec<PostView>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostPage {
    pub current_user: Option<CurrentUserView>,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub flashes: Vec<Flash>,
}

/// The edit form, prefilled from the stored post.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EditPostPage {
    pub current_user: CurrentUserView,
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    pub form: PostForm,
    pub flashes: Vec<Flash>,
}

/// An empty post form.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewPostPage {
    pub current_user: CurrentUserView,
    pub form: PostForm,
    pub flashes: Vec<Flash>,
}

/// The post about to be deleted. Deletion itself is a `POST` to the same path.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletePostPage {
    pub current_user: CurrentUserView,
    pub post: PostView,
    pub flashes: Vec<Flash>,
}
