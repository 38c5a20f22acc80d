//! Response envelope for all non-proxied responses.
//!
//! # Responsibilities
//! - Define the `{status, message, data, code}` envelope
//! - Provide the canonical failure/success constructors
//! - Map `code` onto the HTTP status line
//!
//! # Design Decisions
//! - `code` doubles as the HTTP status code
//! - Proxied responses bypass the envelope entirely; only the gateway's
//!   own verdicts (routing failures, auth denials, register/authenticate)
//!   use it
//! - No internal detail ever leaks into `message`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Structured envelope returned whenever the gateway answers for itself.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    /// Canonical tag, e.g. `"unauthorized"`.
    pub status: &'static str,
    /// Human-readable summary.
    pub message: String,
    /// Payload object; empty for plain verdicts.
    pub data: Value,
    /// HTTP status code this envelope is served with.
    pub code: u16,
}

impl ApiResponse {
    fn new(status: &'static str, message: &str, code: u16) -> Self {
        Self {
            status,
            message: message.to_string(),
            data: Value::Object(Default::default()),
            code,
        }
    }

    pub fn success() -> Self {
        Self::new("success", "Success", 200)
    }

    pub fn unauthorized() -> Self {
        Self::new("unauthorized", "Not Authorized", 401)
    }

    pub fn route_not_found() -> Self {
        Self::new("route_not_found", "Route Not Found", 404)
    }

    pub fn permission_lacking() -> Self {
        Self::new("permission_lacking", "Permission Insufficient", 403)
    }

    pub fn rate_limited() -> Self {
        Self::new("rate_limited", "Rate limited", 429)
    }

    pub fn backend_not_found() -> Self {
        Self::new("backend_not_found", "No backends found", 502)
    }

    pub fn backend_disconnected() -> Self {
        Self::new("backend_disconnected", "Backend Disconnected", 503)
    }

    pub fn internal_error() -> Self {
        Self::new("error_internal", "Internal Error Occurred", 500)
    }

    /// Attach a payload object to the envelope.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Replace the default message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_codes() {
        assert_eq!(ApiResponse::success().code, 200);
        assert_eq!(ApiResponse::unauthorized().code, 401);
        assert_eq!(ApiResponse::route_not_found().code, 404);
        assert_eq!(ApiResponse::permission_lacking().code, 403);
        assert_eq!(ApiResponse::rate_limited().code, 429);
        assert_eq!(ApiResponse::backend_not_found().code, 502);
        assert_eq!(ApiResponse::backend_disconnected().code, 503);
        assert_eq!(ApiResponse::internal_error().code, 500);
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = ApiResponse::success()
            .with_data(serde_json::json!({"apiKey": "k"}))
            .with_message("ok");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "ok");
        assert_eq!(value["data"]["apiKey"], "k");
        assert_eq!(value["code"], 200);
    }
}
