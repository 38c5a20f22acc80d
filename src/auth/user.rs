//! User records and their transient identity view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A persisted user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Stable identifier, caller- or system-assigned.
    pub user_id: String,
    /// Unique login/display name.
    pub username: String,
    /// One-way password digest; opaque to everything but the authenticator.
    pub password_hash: String,
    /// Open key→value map (group membership, public profile fields, ...).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Optional long-lived opaque credential, unique per user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Read-only identity projection produced on successful credential
/// resolution. Never persisted.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub metadata: Map<String, Value>,
}

impl From<&UserRecord> for AuthenticatedUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            username: record.username.clone(),
            metadata: record.metadata.clone(),
        }
    }
}
