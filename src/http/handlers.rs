//! Registration and authentication endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::http::response::ApiResponse;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

/// `POST /register`: create or re-register a user. Guarded by the shared
/// static registration key.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> ApiResponse {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.registration_key.as_str()) {
        return ApiResponse::unauthorized();
    }

    match state
        .authenticator
        .create_user(
            body.user_id.as_deref(),
            &body.username,
            &body.password,
            body.metadata,
        )
        .await
    {
        Ok(user_id) => ApiResponse::success()
            .with_message("User created successfully.")
            .with_data(json!({ "userId": user_id })),
        Err(error) => {
            tracing::error!(%error, "Registration failed");
            ApiResponse::internal_error()
        }
    }
}

/// `POST /authenticate`: verify credentials and hand back a fresh API
/// key (never the raw bearer token).
pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateRequest>,
) -> ApiResponse {
    let Some(token) = state
        .authenticator
        .authenticate(&body.username, &body.password)
        .await
    else {
        return ApiResponse::unauthorized();
    };
    // resolve through the normal credential path to recover the user id
    let Some(user) = state.authenticator.resolve_credential(&token).await else {
        return ApiResponse::unauthorized();
    };

    match state.authenticator.issue_api_key(&user.user_id).await {
        Ok(api_key) => ApiResponse::success().with_data(json!({ "apiKey": api_key })),
        Err(error) => {
            tracing::error!(%error, "API key issuance failed");
            ApiResponse::internal_error()
        }
    }
}
