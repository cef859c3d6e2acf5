//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request forms and JSON views
//! - **[`flash`]**: One-shot messages carried across redirects
//!
//! # Routes
//!
//! - **Blog** (`/`, `/post/{id}`): public reading, commenting for any logged-in identity
//! - **Editing** (`/new-post`, `/edit-post/{id}`): executives and directors
//! - **Admin** (`/delete/{id}`, `/admin/*`): executives only
//! - **Accounts** (`/register`, `/login`, `/logout`)
//! - **Badge API** (`/api/authenticate_badge_pin`): JSON, no session
//!
//! OpenAPI documentation is served at `/docs`.

pub mod flash;
pub mod handlers;
pub mod models;
