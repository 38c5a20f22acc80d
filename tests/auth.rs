//! Authenticator behavior: issuance, resolution, caching, rotation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use gatewarden::auth::{Authenticator, MemoryUserStore, API_KEY_LEN};
use gatewarden::config::AuthConfig;

fn config() -> AuthConfig {
    AuthConfig {
        token_secret: "test-secret".to_string(),
        token_lifetime_secs: 3600,
        cache_ttl_secs: 300,
        ..Default::default()
    }
}

fn authenticator(config: &AuthConfig) -> Arc<Authenticator> {
    Arc::new(Authenticator::new(Arc::new(MemoryUserStore::new()), config))
}

#[tokio::test]
async fn test_token_round_trip() {
    let auth = authenticator(&config());
    auth.create_user(Some("u-1"), "alice", "wand", None)
        .await
        .unwrap();

    let token = auth.authenticate("alice", "wand").await.unwrap();
    // tokens are longer than the canonical key length, so this exercises
    // the token resolution path
    assert_ne!(token.len(), API_KEY_LEN);

    let identity = auth.resolve_credential(&token).await.unwrap();
    assert_eq!(identity.user_id, "u-1");
    assert_eq!(identity.username, "alice");

    // the same token as a full header value
    let identity = auth
        .resolve_credential(&format!("Bearer {token}"))
        .await
        .unwrap();
    assert_eq!(identity.user_id, "u-1");
}

#[tokio::test]
async fn test_token_expiry() {
    let auth = authenticator(&AuthConfig {
        token_lifetime_secs: 1,
        ..config()
    });
    auth.create_user(Some("u-1"), "alice", "wand", None)
        .await
        .unwrap();

    let token = auth.authenticate("alice", "wand").await.unwrap();
    assert!(auth.resolve_credential(&token).await.is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    // the claim expired; the cached token entry must not extend it
    assert!(auth.resolve_credential(&token).await.is_none());
}

#[tokio::test]
async fn test_wrong_password_yields_no_token() {
    let auth = authenticator(&config());
    auth.create_user(Some("u-1"), "alice", "wand", None)
        .await
        .unwrap();

    assert!(auth.authenticate("alice", "broom").await.is_none());
    assert!(auth.authenticate("nobody", "wand").await.is_none());
}

#[tokio::test]
async fn test_scheme_disambiguation_by_length() {
    let auth = authenticator(&config());
    auth.create_user(Some("u-1"), "alice", "wand", None)
        .await
        .unwrap();
    let api_key = auth.issue_api_key("u-1").await.unwrap();
    assert_eq!(api_key.len(), API_KEY_LEN);

    // canonical length routes to key resolution
    assert!(auth.resolve_credential(&api_key).await.is_some());
    let unknown_key = "x".repeat(API_KEY_LEN);
    assert!(auth.resolve_credential(&unknown_key).await.is_none());

    // any other length routes to token verification, which fails for junk
    assert!(auth.resolve_credential("not-a-token").await.is_none());
}

#[tokio::test]
async fn test_non_bearer_schemes_are_rejected() {
    let auth = authenticator(&config());
    auth.create_user(Some("u-1"), "alice", "wand", None)
        .await
        .unwrap();
    let api_key = auth.issue_api_key("u-1").await.unwrap();

    assert!(auth
        .resolve_credential(&format!("Basic {api_key}"))
        .await
        .is_none());
    assert!(auth
        .resolve_credential(&format!("Bearer {api_key}"))
        .await
        .is_some());
    assert!(auth.resolve_credential("").await.is_none());
}

#[tokio::test]
async fn test_api_key_rotation_invalidates_previous_key() {
    let auth = authenticator(&config());
    auth.create_user(Some("u-1"), "alice", "wand", None)
        .await
        .unwrap();

    let first = auth.issue_api_key("u-1").await.unwrap();
    // resolve once so the key sits in the key→id cache
    assert!(auth.resolve_credential(&first).await.is_some());

    let second = auth.issue_api_key("u-1").await.unwrap();
    assert_ne!(first, second);

    assert!(auth.resolve_credential(&first).await.is_none());
    let identity = auth.resolve_credential(&second).await.unwrap();
    assert_eq!(identity.user_id, "u-1");
}

#[tokio::test]
async fn test_reregistration_updates_only_the_password() {
    let auth = authenticator(&config());

    let mut metadata = serde_json::Map::new();
    metadata.insert("group".to_string(), json!("admin"));
    auth.create_user(Some("u-1"), "alice", "wand", Some(metadata))
        .await
        .unwrap();
    let api_key = auth.issue_api_key("u-1").await.unwrap();

    // re-register with a new password and different metadata
    let mut other = serde_json::Map::new();
    other.insert("group".to_string(), json!("guest"));
    auth.create_user(Some("u-1"), "alice", "newt", Some(other))
        .await
        .unwrap();

    assert!(auth.authenticate("alice", "wand").await.is_none());
    assert!(auth.authenticate("alice", "newt").await.is_some());

    // metadata and API key survive re-registration untouched
    let identity = auth.resolve_credential(&api_key).await.unwrap();
    assert_eq!(identity.metadata["group"], "admin");
}

#[tokio::test]
async fn test_default_metadata_merge() {
    let mut cfg = config();
    cfg.default_metadata
        .insert("group".to_string(), json!("user"));
    cfg.default_metadata
        .insert("tier".to_string(), json!("basic"));
    let auth = authenticator(&cfg);

    let mut supplied = serde_json::Map::new();
    supplied.insert("group".to_string(), json!("admin"));
    auth.create_user(Some("u-1"), "alice", "wand", Some(supplied))
        .await
        .unwrap();

    let identity = auth.resolve_by_user_id("u-1").await.unwrap();
    // supplied keys win, untouched defaults remain
    assert_eq!(identity.metadata["group"], "admin");
    assert_eq!(identity.metadata["tier"], "basic");
}

#[tokio::test]
async fn test_generated_user_id_when_absent() {
    let auth = authenticator(&config());
    let user_id = auth
        .create_user(None, "alice", "wand", None)
        .await
        .unwrap();
    assert_eq!(user_id.len(), API_KEY_LEN); // UUID-format id

    let identity = auth.resolve_by_user_id(&user_id).await.unwrap();
    assert_eq!(identity.username, "alice");
}
