//! Expiring key/value maps for the authenticator.
//!
//! # Design Decisions
//! - Per-instance state: caches are constructed with the Authenticator and
//!   torn down with it, never process-wide
//! - Entries expire lazily on read; mutation paths remove entries eagerly
//! - Per-key synchronization only (`DashMap` shard locks); no cross-key
//!   ordering is required

use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A concurrent map whose entries become invisible after a fixed TTL.
pub struct TtlCache<K, V> {
    inner: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: DashMap::new(),
            ttl,
        }
    }

    /// Look up a live entry. Expired entries are dropped on the way out.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.inner.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.inner.remove(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Eagerly drop an entry, e.g. on credential rotation.
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".into(), 1);
        assert_eq!(cache.get("a"), Some(1));
        cache.remove("a");
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(0));
        cache.insert("a".into(), 1);
        assert_eq!(cache.get("a"), None);
        // the expired entry was swept out by the read
        assert_eq!(cache.len(), 0);
    }
}
