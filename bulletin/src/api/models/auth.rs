//! Authentication request/response models.

use super::{optional, required, users::CurrentUserView};
use crate::api::flash::Flash;
use crate::auth::{accounts::NewAccount, roles::RoleTag};
use crate::db::models::users::Identity;
use crate::errors::{Error, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::{IntoParams, ToSchema};

pub const COMPANY_MAX_CHARS: usize = 150;

/// Body of `POST /register`.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: String,
    pub badge: String,
    /// 4 to 6 digits
    pub pin: String,
    pub company: Option<String>,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("badge", &self.badge)
            .field("company", &self.company)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    /// The non-secret fields, echoed back when the badge is already taken.
    pub fn conflict(&self, message: &str) -> RegisterConflict {
        RegisterConflict {
            message: message.to_string(),
            email: self.email.clone(),
            name: self.name.clone(),
            badge: self.badge.clone(),
            company: self.company.clone(),
        }
    }

    pub fn into_account(self) -> Result<NewAccount> {
        let email = required("email", self.email)?;
        let password = required("password", self.password)?;
        let name = required("name", self.name)?;
        let badge = required("badge", self.badge)?;
        let pin = required("pin", self.pin)?;
        let company = optional(self.company);

        if company.as_ref().is_some_and(|c| c.chars().count() > COMPANY_MAX_CHARS) {
            return Err(Error::BadRequest {
                message: format!("company must be at most {COMPANY_MAX_CHARS} characters"),
            });
        }

        Ok(NewAccount {
            email: email.trim().to_string(),
            password,
            name: name.trim().to_string(),
            badge: badge.trim().to_string(),
            pin,
            company,
        })
    }
}

/// `409 Conflict` body for a taken badge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterConflict {
    pub message: String,
    pub email: String,
    pub name: String,
    pub badge: String,
    pub company: Option<String>,
}

/// Body of `POST /login`.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm").field("email", &self.email).finish_non_exhaustive()
    }
}

/// Where to go after logging in.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    pub next: Option<String>,
}

impl LoginQuery {
    /// `next` if it is a local path (a single leading `/`), otherwise `None`.
    pub fn local_next(&self) -> Option<&str> {
        self.next
            .as_deref()
            .filter(|next| next.starts_with('/') && !next.starts_with("//") && !next.contains('\\'))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginPage {
    pub current_user: Option<CurrentUserView>,
    pub next: Option<String>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterPage {
    pub current_user: Option<CurrentUserView>,
    pub allow_registration: bool,
    pub flashes: Vec<Flash>,
}

/// Body of `POST /api/authenticate_badge_pin`. Numbers are accepted for either field.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BadgePinRequest {
    pub badge: Option<String>,
    pub pin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BadgePinStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BadgePinResponse {
    pub status: BadgePinStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<RoleTag>,
}

impl BadgePinResponse {
    pub fn error(message: &str) -> Self {
        Self {
            status: BadgePinStatus::Error,
            message: message.to_string(),
            user_id: None,
            name: None,
            email: None,
            category: None,
        }
    }

    pub fn success(identity: Identity) -> Self {
        Self {
            status: BadgePinStatus::Success,
            message: "Authentication successful".to_string(),
            user_id: Some(identity.id),
            name: Some(identity.name),
            email: Some(identity.email),
            category: Some(identity.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            email: "dana@example.com".to_string(),
            password: "hunter2".to_string(),
            name: "Dana".to_string(),
            badge: "3999".to_string(),
            pin: "4321".to_string(),
            company: Some(String::new()),
        }
    }

    #[test]
    fn test_into_account() {
        let account = form().into_account().unwrap();
        assert_eq!(account.badge, "3999");
        assert_eq!(account.company, None);
    }

    #[test]
    fn test_company_length() {
        let ok = RegisterForm {
            company: Some("x".repeat(COMPANY_MAX_CHARS)),
            ..form()
        };
        assert!(ok.into_account().is_ok());

        let too_long = RegisterForm {
            company: Some("x".repeat(COMPANY_MAX_CHARS + 1)),
            ..form()
        };
        assert!(matches!(too_long.into_account(), Err(Error::BadRequest { .. })));
    }

    #[test]
    fn test_required_fields() {
        let err = RegisterForm { pin: String::new(), ..form() }.into_account().unwrap_err();
        assert_eq!(err.user_message(), "pin is required");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let printed = format!("{:?}", form());
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("4321"));
    }

    #[test]
    fn test_local_next() {
        let query = |next: &str| LoginQuery {
            next: Some(next.to_string()),
        };
        assert_eq!(query("/edit-post/1?x=2").local_next(), Some("/edit-post/1?x=2"));
        assert_eq!(query("//evil.example.com").local_next(), None);
        assert_eq!(query("https://evil.example.com/").local_next(), None);
        assert_eq!(query("/\\evil.example.com").local_next(), None);
        assert_eq!(LoginQuery::default().local_next(), None);
    }

    #[test]
    fn test_badge_pin_error_body_has_no_identity_fields() {
        let body = serde_json::to_value(BadgePinResponse::error("Invalid PIN")).unwrap();
        assert_eq!(body, serde_json::json!({"status": "error", "message": "Invalid PIN"}));
    }
}
