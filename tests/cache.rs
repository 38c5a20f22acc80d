//! Cache capability behavior against a live gateway.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

mod common;

#[tokio::test]
async fn test_global_cache_suppresses_repeat_forwarding() {
    let backend: SocketAddr = "127.0.0.1:29201".parse().unwrap();
    let gateway: SocketAddr = "127.0.0.1:29202".parse().unwrap();

    let calls = common::start_counting_backend(backend, "cached").await;

    let mut entry = common::route_entry("/feed", &[&format!("http://{backend}")]);
    entry.cache.interval = 2;
    entry.cache.global_cached = true;

    common::start_gateway(gateway, vec![entry]).await;

    let first = reqwest::get(format!("http://{gateway}/feed"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let second = reqwest::get(format!("http://{gateway}/feed"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // identical bodies, single backend call
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(3)).await;

    let third = reqwest::get(format!("http://{gateway}/feed"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(third, "cached");
    // the window elapsed, so the third request reached the backend
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_per_user_cache_is_keyed_by_identity() {
    let backend: SocketAddr = "127.0.0.1:29211".parse().unwrap();
    let gateway: SocketAddr = "127.0.0.1:29212".parse().unwrap();

    let calls = common::start_counting_backend(backend, "per-user").await;

    let mut entry = common::route_entry("/feed", &[&format!("http://{backend}")]);
    entry.cache.interval = 30;
    entry.cache.user_cached = true;

    let authenticator = common::start_gateway(gateway, vec![entry]).await;

    let mut metadata = serde_json::Map::new();
    metadata.insert("group".to_string(), json!("user"));
    authenticator
        .create_user(Some("u-1"), "alice", "pw", Some(metadata.clone()))
        .await
        .unwrap();
    authenticator
        .create_user(Some("u-2"), "bob", "pw", Some(metadata))
        .await
        .unwrap();
    let alice_key = authenticator.issue_api_key("u-1").await.unwrap();
    let bob_key = authenticator.issue_api_key("u-2").await.unwrap();

    let client = reqwest::Client::new();
    let get = |key: String| {
        let client = client.clone();
        async move {
            client
                .get(format!("http://{gateway}/feed"))
                .header("Authorization", format!("Bearer {key}"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        }
    };

    // two requests for the same identity share one backend call
    get(alice_key.clone()).await;
    get(alice_key.clone()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // a different identity has its own slot
    get(bob_key).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // and the original identity still hits its cache
    get(alice_key).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_interval_disables_caching() {
    let backend: SocketAddr = "127.0.0.1:29221".parse().unwrap();
    let gateway: SocketAddr = "127.0.0.1:29222".parse().unwrap();

    let calls = common::start_counting_backend(backend, "live").await;

    let mut entry = common::route_entry("/feed", &[&format!("http://{backend}")]);
    entry.cache.interval = 0;
    entry.cache.global_cached = true;

    common::start_gateway(gateway, vec![entry]).await;

    for _ in 0..3 {
        reqwest::get(format!("http://{gateway}/feed"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
