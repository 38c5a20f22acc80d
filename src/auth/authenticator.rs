//! Credential issuance and resolution.
//!
//! # Responsibilities
//! - Register users (digest, default-metadata merge, upsert)
//! - Issue signed bearer tokens and opaque API keys
//! - Resolve a presented credential to an identity through three layered
//!   caches (token→id, key→id, id→identity)
//!
//! # Design Decisions
//! - Authentication failure is always `None`, never an error: callers
//!   decide the response code
//! - Bearer values are disambiguated by length: the canonical API-key
//!   length (36, a UUID) routes to key resolution, anything else to
//!   token verification
//! - Caches live on the instance and die with it; credential rotation
//!   eagerly drops the affected entries before returning

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::auth::cache::TtlCache;
use crate::auth::store::{FieldUpdate, SharedUserStore, StoreError, UserQuery};
use crate::auth::user::{AuthenticatedUser, UserRecord};
use crate::config::AuthConfig;

/// Canonical API-key length: a hyphenated UUID. Used as the scheme
/// discriminator against bearer tokens, which are always longer.
pub const API_KEY_LEN: usize = 36;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Subject,
    exp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Subject {
    #[serde(rename = "userId")]
    user_id: String,
}

/// The authentication/credential-resolution engine.
pub struct Authenticator {
    store: SharedUserStore,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_lifetime: Duration,
    default_metadata: Map<String, Value>,
    /// token → (userId, exp); avoids re-verifying an already-seen token.
    token_ids: TtlCache<String, (String, u64)>,
    /// apiKey → userId.
    key_ids: TtlCache<String, String>,
    /// userId → identity projection.
    identities: TtlCache<String, AuthenticatedUser>,
}

impl Authenticator {
    pub fn new(store: SharedUserStore, config: &AuthConfig) -> Self {
        let secret = config.token_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        // tokens are valid strictly until `exp`, no clock grace
        validation.leeway = 0;
        let cache_ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            store,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_lifetime: Duration::from_secs(config.token_lifetime_secs),
            default_metadata: config.default_metadata.clone(),
            token_ids: TtlCache::new(cache_ttl),
            key_ids: TtlCache::new(cache_ttl),
            identities: TtlCache::new(cache_ttl),
        }
    }

    /// Register or re-register a user. Returns the effective user id.
    ///
    /// For an existing `user_id` only the password hash changes; username,
    /// metadata and any issued API key stay untouched. New users get the
    /// configured default metadata with the supplied entries laid over it.
    pub async fn create_user(
        &self,
        user_id: Option<&str>,
        username: &str,
        password: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<String, StoreError> {
        let password_hash = hash_password(password);
        let user_id = user_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(existing) = self.store.find(UserQuery::ById(&user_id)).await? {
            self.store
                .update_field(&existing.user_id, FieldUpdate::PasswordHash(password_hash))
                .await?;
            self.identities.remove(existing.user_id.as_str());
            tracing::debug!(user_id = %existing.user_id, "Password updated for existing user");
            return Ok(existing.user_id);
        }

        let mut merged = self.default_metadata.clone();
        if let Some(supplied) = metadata {
            merged.extend(supplied);
        }
        let record = UserRecord {
            user_id: user_id.clone(),
            username: username.to_string(),
            password_hash,
            metadata: merged,
            api_key: None,
        };
        self.store.upsert(record).await?;
        self.identities.remove(user_id.as_str());
        tracing::debug!(user_id = %user_id, username = %username, "User created");
        Ok(user_id)
    }

    /// Verify username/password and issue a bearer token carrying the
    /// resolved user id. `None` on any mismatch.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        let password_hash = hash_password(password);
        let record = match self
            .store
            .find(UserQuery::ByCredentials {
                username,
                password_hash: &password_hash,
            })
            .await
        {
            Ok(found) => found?,
            Err(error) => {
                tracing::warn!(%error, "User store lookup failed during authentication");
                return None;
            }
        };

        let exp = now_unix() + self.token_lifetime.as_secs();
        let claims = Claims {
            sub: Subject {
                user_id: record.user_id,
            },
            exp,
        };
        match encode(&Header::default(), &claims, &self.encoding_key) {
            Ok(token) => Some(token),
            Err(error) => {
                tracing::error!(%error, "Token signing failed");
                None
            }
        }
    }

    /// Generate a fresh API key for `user_id`, persist it, and drop the
    /// stale key→id cache entry for any prior key.
    pub async fn issue_api_key(&self, user_id: &str) -> Result<String, StoreError> {
        let record = self
            .store
            .find(UserQuery::ById(user_id))
            .await?
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;

        let key = Uuid::new_v4().to_string();
        self.store
            .update_field(user_id, FieldUpdate::ApiKey(key.clone()))
            .await?;
        if let Some(previous) = record.api_key {
            self.key_ids.remove(previous.as_str());
        }
        self.key_ids.insert(key.clone(), user_id.to_string());
        tracing::debug!(user_id = %user_id, "API key issued");
        Ok(key)
    }

    /// Resolve any presented credential to an identity.
    ///
    /// Accepts a raw bearer token, a raw API key, or a full
    /// `Authorization: Bearer <value>` header value. Non-bearer schemes
    /// and every verification failure collapse to `None`.
    pub async fn resolve_credential(&self, credential: &str) -> Option<AuthenticatedUser> {
        let value = strip_scheme(credential)?;
        if value.len() == API_KEY_LEN {
            self.resolve_api_key(value).await
        } else {
            self.resolve_token(value).await
        }
    }

    async fn resolve_token(&self, token: &str) -> Option<AuthenticatedUser> {
        if let Some((user_id, exp)) = self.token_ids.get(token) {
            // cached claims still honor their own expiry
            if exp > now_unix() {
                return self.resolve_by_user_id(&user_id).await;
            }
            self.token_ids.remove(token);
            return None;
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).ok()?;
        let user_id = data.claims.sub.user_id;
        self.token_ids
            .insert(token.to_string(), (user_id.clone(), data.claims.exp));
        self.resolve_by_user_id(&user_id).await
    }

    async fn resolve_api_key(&self, key: &str) -> Option<AuthenticatedUser> {
        if let Some(user_id) = self.key_ids.get(key) {
            return self.resolve_by_user_id(&user_id).await;
        }

        let record = match self.store.find(UserQuery::ByApiKey(key)).await {
            Ok(found) => found?,
            Err(error) => {
                tracing::warn!(%error, "User store lookup failed during key resolution");
                return None;
            }
        };
        self.key_ids.insert(key.to_string(), record.user_id.clone());
        // the record is already in hand; warm the identity cache from it
        let identity = AuthenticatedUser::from(&record);
        self.identities.insert(record.user_id.clone(), identity.clone());
        Some(identity)
    }

    /// Identity lookup by user id, through the identity cache.
    pub async fn resolve_by_user_id(&self, user_id: &str) -> Option<AuthenticatedUser> {
        if let Some(identity) = self.identities.get(user_id) {
            return Some(identity);
        }

        let record = match self.store.find(UserQuery::ById(user_id)).await {
            Ok(found) => found?,
            Err(error) => {
                tracing::warn!(%error, "User store lookup failed during identity resolution");
                return None;
            }
        };
        let identity = AuthenticatedUser::from(&record);
        self.identities.insert(record.user_id.clone(), identity.clone());
        Some(identity)
    }
}

/// SHA-256 hex digest of the password. The storage scheme is opaque to
/// everything outside this module.
fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Split an `Authorization`-style value on its scheme. A bare value is
/// returned as-is; a two-part value must carry the `Bearer` scheme.
fn strip_scheme(credential: &str) -> Option<&str> {
    let mut parts = credential.split_whitespace();
    let first = parts.next()?;
    match parts.next() {
        None => Some(first),
        Some(value) => {
            if first.eq_ignore_ascii_case("bearer") && parts.next().is_none() {
                Some(value)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("abc"), Some("abc"));
        assert_eq!(strip_scheme("Bearer abc"), Some("abc"));
        assert_eq!(strip_scheme("bearer abc"), Some("abc"));
        assert_eq!(strip_scheme("Basic abc"), None);
        assert_eq!(strip_scheme(""), None);
        assert_eq!(strip_scheme("Bearer a b"), None);
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let digest = hash_password("hunter2");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_password("hunter2"));
        assert_ne!(digest, hash_password("hunter3"));
    }

    #[test]
    fn test_api_key_len_matches_uuid() {
        assert_eq!(Uuid::new_v4().to_string().len(), API_KEY_LEN);
    }
}
