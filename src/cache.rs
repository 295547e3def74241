//! Keyed cache for remote resources with scoped invalidation.
//!
//! Models the remote-resource + staleness + invalidation behavior the data
//! hooks rely on: a shared, hierarchically-keyed map of JSON values.
//! Invalidation is prefix-scoped; [`invalidate_all`](ResourceCache::invalidate_all)
//! exists for the rare flows that truly need it, and the auth failure path
//! never calls it — an expired session evicts only the failing key's scope so
//! unrelated cached data survives the hiccup.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use crate::{
    error::{ErrorClass, StudiaError},
    retry::RetryPolicy,
};

/// Hierarchical cache key, e.g. `["profile"]` or `["plans", "42", "lessons"]`.
/// The first segment is the key's scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CacheKey(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The key truncated to its first segment.
    pub fn scope(&self) -> CacheKey {
        CacheKey(self.0.iter().take(1).cloned().collect())
    }

    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

#[derive(Debug, Clone)]
struct CacheSlot {
    value: Value,
    stored_at: Instant,
}

/// Shared keyed cache of JSON resource snapshots.
///
/// Thread-safe via an internal lock; the intended usage is a single logical
/// owner per surface with interleaved async callbacks, not parallel writers.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<BTreeMap<CacheKey, CacheSlot>>,
    /// Entries older than this are treated as absent. `None` disables
    /// staleness checks.
    ttl: Option<Duration>,
}

impl ResourceCache {
    pub fn new() -> Self {
        ResourceCache::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        ResourceCache {
            entries: RwLock::new(BTreeMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(slot) if !self.is_stale(slot) => return Some(slot.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Stale entry: drop it so the next fetch repopulates.
        self.entries.write().remove(key);
        None
    }

    pub fn set(&self, key: CacheKey, value: Value) {
        self.entries.write().insert(
            key,
            CacheSlot {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Evict every entry under `prefix`. Returns the number of evictions.
    pub fn invalidate(&self, prefix: &CacheKey) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let evicted = before - entries.len();
        tracing::debug!(prefix = %prefix, evicted, "cache invalidation");
        evicted
    }

    /// Evict everything. Reserved for flows that genuinely need a cold cache
    /// (e.g. explicit logout); error handling paths must use scoped
    /// [`invalidate`](Self::invalidate) instead.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write();
        let evicted = entries.len();
        entries.clear();
        tracing::debug!(evicted, "full cache invalidation");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Fetch-through: return the cached value when fresh, otherwise run the
    /// operation under the retry policy and cache its result.
    ///
    /// On an auth-classified failure only the key's scope is evicted — never
    /// the whole cache — so in-flight and cached data for other resources
    /// survives an expired session.
    pub async fn fetch_with<F, Fut>(
        &self,
        key: CacheKey,
        policy: &RetryPolicy,
        operation: F,
    ) -> Result<Value, StudiaError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Value, StudiaError>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        match policy.run(operation).await {
            Ok(value) => {
                self.set(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                if err.classification() == ErrorClass::Auth {
                    let scope = key.scope();
                    let evicted = self.invalidate(&scope);
                    tracing::debug!(
                        scope = %scope,
                        evicted,
                        "auth failure, evicted scoped entries only"
                    );
                }
                Err(err)
            }
        }
    }

    fn is_stale(&self, slot: &CacheSlot) -> bool {
        match self.ttl {
            Some(ttl) => slot.stored_at.elapsed() > ttl,
            None => false,
        }
    }
}
