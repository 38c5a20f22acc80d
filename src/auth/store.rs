//! Persistent user store boundary.
//!
//! # Responsibilities
//! - Define the three store operations the gateway core relies on:
//!   find-by-query, upsert, partial field update
//! - Provide a JSON-file-backed default implementation
//! - Provide a purely in-memory implementation for tests
//!
//! # Design Decisions
//! - The document-store driver is an external collaborator; this trait is
//!   the seam, so swapping in a real driver touches nothing else
//! - Secondary lookups (username, api key) scan the map; fine for the
//!   in-process implementations

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::auth::user::UserRecord;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("user not found: {0}")]
    NotFound(String),
}

/// Typed lookup filters.
#[derive(Debug, Clone, Copy)]
pub enum UserQuery<'a> {
    ById(&'a str),
    ByUsername(&'a str),
    ByApiKey(&'a str),
    /// Username plus password digest, matched together.
    ByCredentials {
        username: &'a str,
        password_hash: &'a str,
    },
}

/// Partial updates that leave every other field untouched.
#[derive(Debug, Clone)]
pub enum FieldUpdate {
    PasswordHash(String),
    ApiKey(String),
}

/// The store operations the authenticator depends on.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, query: UserQuery<'_>) -> Result<Option<UserRecord>, StoreError>;
    async fn upsert(&self, record: UserRecord) -> Result<(), StoreError>;
    async fn update_field(&self, user_id: &str, update: FieldUpdate) -> Result<(), StoreError>;
}

fn matches(record: &UserRecord, query: UserQuery<'_>) -> bool {
    match query {
        UserQuery::ById(id) => record.user_id == id,
        UserQuery::ByUsername(name) => record.username == name,
        UserQuery::ByApiKey(key) => record.api_key.as_deref() == Some(key),
        UserQuery::ByCredentials {
            username,
            password_hash,
        } => record.username == username && record.password_hash == password_hash,
    }
}

/// In-memory store, used by unit and integration tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, UserRecord>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, query: UserQuery<'_>) -> Result<Option<UserRecord>, StoreError> {
        if let UserQuery::ById(id) = query {
            return Ok(self.users.get(id).map(|r| r.value().clone()));
        }
        Ok(self
            .users
            .iter()
            .find(|r| matches(r.value(), query))
            .map(|r| r.value().clone()))
    }

    async fn upsert(&self, record: UserRecord) -> Result<(), StoreError> {
        self.users.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn update_field(&self, user_id: &str, update: FieldUpdate) -> Result<(), StoreError> {
        let mut entry = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        match update {
            FieldUpdate::PasswordHash(hash) => entry.password_hash = hash,
            FieldUpdate::ApiKey(key) => entry.api_key = Some(key),
        }
        Ok(())
    }
}

/// JSON-file-backed store: loaded once at startup, rewritten after every
/// mutation. Suits the gateway's low-write, read-through-cache access
/// pattern.
pub struct JsonUserStore {
    inner: MemoryUserStore,
    path: PathBuf,
}

impl JsonUserStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = MemoryUserStore::new();
        if path.exists() {
            let raw = std::fs::read(&path)?;
            let users: Vec<UserRecord> = serde_json::from_slice(&raw)?;
            let count = users.len();
            for user in users {
                inner.users.insert(user.user_id.clone(), user);
            }
            tracing::info!(path = %path.display(), users = count, "User store loaded");
        }
        Ok(Self { inner, path })
    }

    async fn persist(&self) -> Result<(), StoreError> {
        // Sort by user id so the file is stable across rewrites.
        let users: BTreeMap<String, UserRecord> = self
            .inner
            .users
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let records: Vec<&UserRecord> = users.values().collect();
        let raw = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn find(&self, query: UserQuery<'_>) -> Result<Option<UserRecord>, StoreError> {
        self.inner.find(query).await
    }

    async fn upsert(&self, record: UserRecord) -> Result<(), StoreError> {
        self.inner.upsert(record).await?;
        self.persist().await
    }

    async fn update_field(&self, user_id: &str, update: FieldUpdate) -> Result<(), StoreError> {
        self.inner.update_field(user_id, update).await?;
        self.persist().await
    }
}

/// Shared handle used across the gateway.
pub type SharedUserStore = Arc<dyn UserStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn record(id: &str, name: &str) -> UserRecord {
        UserRecord {
            user_id: id.to_string(),
            username: name.to_string(),
            password_hash: "digest".to_string(),
            metadata: Map::new(),
            api_key: None,
        }
    }

    #[tokio::test]
    async fn test_memory_find_by_each_filter() {
        let store = MemoryUserStore::new();
        let mut user = record("u1", "alice");
        user.api_key = Some("key-1".to_string());
        store.upsert(user).await.unwrap();

        assert!(store.find(UserQuery::ById("u1")).await.unwrap().is_some());
        assert!(store
            .find(UserQuery::ByUsername("alice"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find(UserQuery::ByApiKey("key-1"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find(UserQuery::ByCredentials {
                username: "alice",
                password_hash: "digest",
            })
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find(UserQuery::ByCredentials {
                username: "alice",
                password_hash: "wrong",
            })
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_field_leaves_rest_untouched() {
        let store = MemoryUserStore::new();
        let mut user = record("u1", "alice");
        user.metadata
            .insert("group".to_string(), serde_json::json!("admin"));
        store.upsert(user).await.unwrap();

        store
            .update_field("u1", FieldUpdate::PasswordHash("new".to_string()))
            .await
            .unwrap();

        let found = store.find(UserQuery::ById("u1")).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new");
        assert_eq!(found.metadata["group"], "admin");
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        {
            let store = JsonUserStore::open(&path).unwrap();
            store.upsert(record("u1", "alice")).await.unwrap();
        }

        let reloaded = JsonUserStore::open(&path).unwrap();
        let found = reloaded.find(UserQuery::ById("u1")).await.unwrap();
        assert_eq!(found.unwrap().username, "alice");
    }
}
