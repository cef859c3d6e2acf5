//! Request forms and JSON views.
//!
//! Forms arrive as `application/x-www-form-urlencoded` bodies. Every field deserializes with a
//! default so that a missing field and an empty one are reported the same way, by
//! [`required`], as a `400 Bad Request` naming the field.

pub mod auth;
pub mod posts;
pub mod users;

use crate::errors::{Error, Result};

/// A field that must be present and not blank.
pub(crate) fn required(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    Ok(value)
}

/// An optional field; blank counts as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
