//! One-shot flash messages.
//!
//! Messages queued before a redirect travel in the `bulletin_flash` cookie (base64 of a JSON
//! array) and are handed to the next view, which clears the cookie.

use std::convert::Infallible;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::utils::{expired_cookie, read_cookie};

pub const FLASH_COOKIE: &str = "bulletin_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Flash messages pending for this client, plus any queued by the current handler.
#[derive(Debug, Default)]
pub struct Flashes {
    messages: Vec<Flash>,
}

impl Flashes {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let messages = read_cookie(headers, FLASH_COOKIE)
            .and_then(|value| {
                let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
                serde_json::from_slice::<Vec<Flash>>(&bytes).ok()
            })
            .unwrap_or_default();
        Self { messages }
    }

    /// Queue a message for the next view.
    pub fn push(mut self, level: FlashLevel, message: impl Into<String>) -> Self {
        self.messages.push(Flash::new(level, message));
        self
    }

    pub fn messages(&self) -> &[Flash] {
        &self.messages
    }

    /// `303 See Other` to `location`, carrying every queued message.
    pub fn redirect(self, location: &str) -> Response {
        let mut response = Redirect::to(location).into_response();
        if let Some(cookie) = self.cookie() {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        response
    }

    /// Render a view. The queued messages are consumed and the cookie is cleared.
    pub fn render<T, F>(self, view: F) -> Response
    where
        T: Serialize,
        F: FnOnce(Vec<Flash>) -> T,
    {
        let had_cookie = !self.messages.is_empty();
        let mut response = Json(view(self.messages)).into_response();
        if had_cookie && let Ok(cookie) = HeaderValue::from_str(&expired_cookie(FLASH_COOKIE)) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        response
    }

    fn cookie(&self) -> Option<HeaderValue> {
        if self.messages.is_empty() {
            return None;
        }
        let json = serde_json::to_vec(&self.messages).ok()?;
        let value = format!("{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", URL_SAFE_NO_PAD.encode(json));
        HeaderValue::from_str(&value).ok()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Flashes {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Flash messages set by a response, as a browser would read them back.
    pub fn flashes_in(response: &axum_test::TestResponse) -> Vec<Flash> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .filter(|(name, _)| *name == FLASH_COOKIE)
            .filter_map(|(_, value)| URL_SAFE_NO_PAD.decode(value).ok())
            .filter_map(|bytes| serde_json::from_slice::<Vec<Flash>>(&bytes).ok())
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_from(response: &Response) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().to_string();
            headers.append(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        }
        headers
    }

    #[test]
    fn test_redirect_carries_messages_to_next_view() {
        let response = Flashes::default()
            .push(FlashLevel::Warning, "first")
            .push(FlashLevel::Success, "second")
            .redirect("/login");
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

        let next = Flashes::from_headers(&headers_from(&response));
        assert_eq!(
            next.messages(),
            &[Flash::new(FlashLevel::Warning, "first"), Flash::new(FlashLevel::Success, "second")]
        );
    }

    #[test]
    fn test_render_clears_cookie() {
        let pending = Flashes::default().push(FlashLevel::Info, "hello").redirect("/");
        let flashes = Flashes::from_headers(&headers_from(&pending));

        let response = flashes.render(|messages| messages.len());
        let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.starts_with("bulletin_flash=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_render_without_messages_sets_no_cookie() {
        let response = Flashes::default().render(|messages| messages.len());
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("bulletin_flash=%%%not-base64"));
        assert!(Flashes::from_headers(&headers).messages().is_empty());
    }
}
