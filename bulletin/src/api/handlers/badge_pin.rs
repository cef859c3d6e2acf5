use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use tracing::debug;

use crate::{
    AppState,
    api::models::auth::{BadgePinRequest, BadgePinResponse},
    auth::badge_pin::{BadgePinOutcome, authenticate_badge_pin},
    errors::Result,
};

/// A badge or PIN as sent by the client. Devices often send them as JSON numbers.
fn field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Verify a badge and PIN without starting a session
#[utoipa::path(
    post,
    path = "/api/authenticate_badge_pin",
    tag = "badge",
    request_body = BadgePinRequest,
    responses(
        (status = 200, description = "Authentication successful", body = BadgePinResponse),
        (status = 400, description = "Body is not a non-empty JSON object, or badge or pin is missing", body = BadgePinResponse),
        (status = 401, description = "Invalid PIN", body = BadgePinResponse),
        (status = 404, description = "Badge not found", body = BadgePinResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn authenticate(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BadgePinResponse>)> {
    // An empty object is treated like a missing body
    let body = match body {
        Ok(Json(body)) if body.as_object().is_some_and(|fields| !fields.is_empty()) => body,
        Ok(_) => return Ok((StatusCode::BAD_REQUEST, Json(BadgePinResponse::error("Request must be JSON")))),
        Err(rejection) => {
            debug!("Rejected badge request body: {rejection}");
            return Ok((StatusCode::BAD_REQUEST, Json(BadgePinResponse::error("Request must be JSON"))));
        }
    };

    let badge = field(&body, "badge");
    let pin = field(&body, "pin");

    let (status, response) = match authenticate_badge_pin(state.store.as_ref(), badge.as_deref(), pin.as_deref()).await? {
        BadgePinOutcome::Authenticated(identity) => (StatusCode::OK, BadgePinResponse::success(identity)),
        BadgePinOutcome::MissingInput => (StatusCode::BAD_REQUEST, BadgePinResponse::error("Missing badge or pin")),
        BadgePinOutcome::BadgeNotFound => (StatusCode::NOT_FOUND, BadgePinResponse::error("Badge not found")),
        BadgePinOutcome::InvalidPin => (StatusCode::UNAUTHORIZED, BadgePinResponse::error("Invalid PIN")),
    };
    Ok((status, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_server, create_test_state, seed_identity};
    use axum::http::header;
    use serde_json::json;

    const PATH: &str = "/api/authenticate_badge_pin";

    #[test_log::test(tokio::test)]
    async fn test_director_success() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3999", "password", "4321").await;
        let server = create_test_server(state.clone());

        let response = server.post(PATH).json(&json!({"badge": "3999", "pin": "4321"})).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({
                "status": "success",
                "message": "Authentication successful",
                "user_id": director.id,
                "name": "Test User",
                "email": "dir@example.com",
                "category": "director",
            })
        );
        // No session is issued
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_numeric_fields() {
        let state = create_test_state();
        seed_identity(&state, "dir@example.com", "3999", "password", "4321").await;
        let server = create_test_server(state);

        server
            .post(PATH)
            .json(&json!({"badge": 3999, "pin": 4321}))
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_failures() {
        let state = create_test_state();
        seed_identity(&state, "dir@example.com", "3999", "password", "4321").await;
        let server = create_test_server(state);

        let cases = [
            (json!({"badge": "3999", "pin": "0000"}), StatusCode::UNAUTHORIZED, "Invalid PIN"),
            (json!({"badge": "3999", "pin": "password"}), StatusCode::UNAUTHORIZED, "Invalid PIN"),
            (json!({"badge": "0000", "pin": "4321"}), StatusCode::NOT_FOUND, "Badge not found"),
            (json!({"badge": "3999"}), StatusCode::BAD_REQUEST, "Missing badge or pin"),
            (json!({"badge": "", "pin": "4321"}), StatusCode::BAD_REQUEST, "Missing badge or pin"),
            (json!(["3999", "4321"]), StatusCode::BAD_REQUEST, "Request must be JSON"),
            (json!({}), StatusCode::BAD_REQUEST, "Request must be JSON"),
            (json!({"card": "3999"}), StatusCode::BAD_REQUEST, "Missing badge or pin"),
        ];
        for (request, status, message) in cases {
            let response = server.post(PATH).json(&request).await;
            response.assert_status(status);
            let body: Value = response.json();
            assert_eq!(body, json!({"status": "error", "message": message}), "{request}");
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_non_json_body() {
        let state = create_test_state();
        let server = create_test_server(state);

        let response = server.post(PATH).text("badge=3999&pin=4321").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"status": "error", "message": "Request must be JSON"}));
    }
}
