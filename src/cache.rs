//! Query cache keyed by semantic keys such as `["children", <classroom_id>]`.
//!
//! Queries populate entries; mutations and realtime events invalidate by key prefix. An
//! invalidated entry is refetched on next read. The cache is a disposable projection of the
//! backend, never a source of truth, so nothing is patched in place.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Ordered tuple identifying a cached query result. Absent scope parts are `null`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        QueryKey(vec![encode_part(&Value::String(root.to_string()))])
    }

    pub fn with(mut self, part: impl Serialize) -> Self {
        let v = serde_json::to_value(part).unwrap_or(Value::Null);
        self.0.push(encode_part(&v));
        self
    }

    /// True when every part of `prefix` equals the corresponding leading part of `self`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        prefix.0.len() <= self.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

fn encode_part(v: &Value) -> String {
    v.to_string()
}

/// Build a key from a root and scope parts: `query_key!("meals", child_id, date)`.
#[macro_export]
macro_rules! query_key {
    ($root:expr $(, $part:expr)* $(,)?) => {
        $crate::cache::QueryKey::new($root)$(.with(&$part))*
    };
}

struct Entry {
    data: Value,
    fetched_at: Instant,
    invalidated: bool,
}

pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    /// Zero: entries stay fresh until invalidated.
    stale_after: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        QueryCache {
            entries: RwLock::new(HashMap::new()),
            stale_after,
        }
    }

    fn is_fresh(&self, e: &Entry) -> bool {
        !e.invalidated && (self.stale_after.is_zero() || e.fetched_at.elapsed() < self.stale_after)
    }

    /// Cached data for `key` when present and fresh.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().ok()?;
        let e = entries.get(key)?;
        if !self.is_fresh(e) {
            return None;
        }
        serde_json::from_value(e.data.clone()).ok()
    }

    pub fn set<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<(), AppError> {
        let data = serde_json::to_value(data)?;
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                Entry {
                    data,
                    fetched_at: Instant::now(),
                    invalidated: false,
                },
            );
        }
        Ok(())
    }

    /// Return fresh cached data or run `fetcher`, store its result and return it.
    /// A fetch error is returned unchanged and leaves the cache untouched.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            tracing::trace!(key = %key, "cache hit");
            return Ok(hit);
        }
        tracing::debug!(key = %key, "cache miss");
        let data = fetcher().await?;
        self.set(key, &data)?;
        Ok(data)
    }

    /// Mark every entry under `prefix` stale. Returns how many entries matched.
    /// Invalidating an already-stale entry is a no-op.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let mut n = 0;
        for (k, e) in entries.iter_mut() {
            if k.starts_with(prefix) {
                e.invalidated = true;
                n += 1;
            }
        }
        tracing::debug!(prefix = %prefix, matched = n, "cache invalidated");
        n
    }

    pub fn invalidate_all(&self, prefixes: &[QueryKey]) {
        for p in prefixes {
            self.invalidate(p);
        }
    }

    /// True when `key` is cached but needs a refetch. Missing keys are not stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).map(|e| !self.is_fresh(e)))
            .unwrap_or(false)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().map(|e| e.contains_key(key)).unwrap_or(false)
    }

    /// Drop every entry under `prefix`.
    pub fn remove(&self, prefix: &QueryKey) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|k, _| !k.starts_with(prefix));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn prefix_matching() {
        let k = query_key!("meals", "child-1", "2026-03-01");
        assert!(k.starts_with(&query_key!("meals")));
        assert!(k.starts_with(&query_key!("meals", "child-1")));
        assert!(!k.starts_with(&query_key!("meals", "child-2")));
        assert!(!query_key!("meals").starts_with(&k));
        assert!(!k.starts_with(&query_key!("meal")));
    }

    #[test]
    fn none_scope_is_a_distinct_part() {
        let all = query_key!("children", None::<String>);
        let one = query_key!("children", Some("c1"));
        assert_ne!(all, one);
        assert_eq!(all.to_string(), "[\"children\", null]");
    }

    #[tokio::test]
    async fn fetch_caches_until_invalidated() {
        let cache = QueryCache::default();
        let calls = AtomicUsize::new(0);
        let key = query_key!("children", "c1");
        for _ in 0..2 {
            let v: Vec<u32> = cache
                .fetch(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2])
                })
                .await
                .unwrap();
            assert_eq!(v, vec![1, 2]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(cache.invalidate(&query_key!("children")), 1);
        assert!(cache.is_stale(&key));
        // idempotent
        assert_eq!(cache.invalidate(&query_key!("children")), 1);

        let _: Vec<u32> = cache
            .fetch(key.clone(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![3])
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_stale(&key));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_untouched() {
        let cache = QueryCache::default();
        let key = query_key!("documents");
        let err = cache
            .fetch::<Vec<u32>, _, _>(key.clone(), || async { Err(AppError::Storage("down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(!cache.contains(&key));
    }

    #[test]
    fn invalidation_leaves_other_roots_alone() {
        let cache = QueryCache::default();
        cache.set(query_key!("notifications", "u1"), &1).unwrap();
        cache.set(query_key!("notifications-unread", "u1"), &1).unwrap();
        cache.set(query_key!("messages", "u1"), &1).unwrap();
        cache.invalidate(&query_key!("notifications"));
        assert!(cache.is_stale(&query_key!("notifications", "u1")));
        assert!(!cache.is_stale(&query_key!("notifications-unread", "u1")));
        assert!(!cache.is_stale(&query_key!("messages", "u1")));
    }

    #[test]
    fn stale_time_expires_entries() {
        let cache = QueryCache::new(Duration::from_nanos(1));
        let key = query_key!("classrooms");
        cache.set(key.clone(), &vec![1]).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get::<Vec<u32>>(&key).is_none());
    }
}
