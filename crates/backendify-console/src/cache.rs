// crates/backendify-console/src/cache.rs
// ============================================================================
// Module: Query Cache
// Description: Tag-invalidated cache of remote query results.
// Purpose: Share fetched schema and record data between views safely.
// Dependencies: backendify-core, crate::telemetry
// ============================================================================

//! ## Overview
//! [`QueryCache`] stores query results under a [`CacheKey`] and drops them by
//! [`CacheTag`]. Each `(project, tag)` pair has a generation counter that
//! invalidation bumps. A fetch remembers the generation it started under and
//! only stores its result when that generation is still current, so a result
//! that raced an invalidation reaches its caller but never the cache.
//!
//! The lock is never held across an await point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;

use backendify_core::ApiError;
use backendify_core::CacheKey;
use backendify_core::CacheTag;
use backendify_core::ProjectId;

use crate::telemetry::ClientEvent;
use crate::telemetry::ClientEventSink;
use crate::telemetry::QueryOutcome;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Cached value of any query result type.
type CachedValue = Arc<dyn Any + Send + Sync>;

/// Mutable cache state.
#[derive(Default)]
struct CacheState {
    /// Stored results.
    entries: BTreeMap<CacheKey, CachedValue>,
    /// Generation per project and tag.
    generations: BTreeMap<(ProjectId, CacheTag), u64>,
}

impl CacheState {
    /// Returns the current generation of a tag.
    fn generation(&self, project: &ProjectId, tag: &CacheTag) -> u64 {
        self.generations.get(&(project.clone(), tag.clone())).copied().unwrap_or(0)
    }
}

/// Result of a locked cache read.
enum Lookup<T> {
    /// Stored value.
    Hit(T),
    /// No value; carries the current tag generation.
    Miss(u64),
    /// Lock poisoned; the cache is bypassed.
    Unavailable,
}

/// Tag-invalidated query cache.
pub struct QueryCache {
    /// Shared state.
    state: Mutex<CacheState>,
    /// Event sink for hit, miss, and invalidation events.
    sink: Arc<dyn ClientEventSink>,
}

impl QueryCache {
    /// Creates an empty cache reporting to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn ClientEventSink>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            sink,
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// # Invariants
    /// - A failed fetch evicts any entry for `key`.
    /// - A result fetched across an invalidation of `key.tag` is returned but
    ///   not stored.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let started_at = match self.lookup::<T>(&key) {
            Lookup::Hit(value) => {
                self.sink.record(&ClientEvent::query(&key, QueryOutcome::Hit, None));
                return Ok(value);
            }
            Lookup::Miss(generation) => Some(generation),
            Lookup::Unavailable => None,
        };
        match fetch().await {
            Ok(value) => {
                if let Ok(mut state) = self.state.lock()
                    && Some(state.generation(&key.project, &key.tag)) == started_at
                {
                    state.entries.insert(key.clone(), Arc::new(value.clone()));
                }
                self.sink.record(&ClientEvent::query(&key, QueryOutcome::Miss, None));
                Ok(value)
            }
            Err(err) => {
                if let Ok(mut state) = self.state.lock() {
                    state.entries.remove(&key);
                }
                self.sink.record(&ClientEvent::query(&key, QueryOutcome::Error, Some(&err)));
                Err(err)
            }
        }
    }

    /// Reads `key` under the lock.
    fn lookup<T: Clone + 'static>(&self, key: &CacheKey) -> Lookup<T> {
        let Ok(state) = self.state.lock() else {
            return Lookup::Unavailable;
        };
        match state.entries.get(key).and_then(|value| value.downcast_ref::<T>()) {
            Some(value) => Lookup::Hit(value.clone()),
            None => Lookup::Miss(state.generation(&key.project, &key.tag)),
        }
    }

    /// Drops every entry under the given tags and bumps their generations.
    pub fn invalidate(&self, project: &ProjectId, tags: &[CacheTag]) {
        if let Ok(mut state) = self.state.lock() {
            for tag in tags {
                *state.generations.entry((project.clone(), tag.clone())).or_insert(0) += 1;
            }
            state.entries.retain(|key, _| &key.project != project || !tags.contains(&key.tag));
        }
        self.sink.record(&ClientEvent::invalidation(project, tags));
    }

    /// Returns the cached value for `key` without fetching.
    #[must_use]
    pub fn peek<T: Clone + 'static>(&self, key: &CacheKey) -> Option<T> {
        let state = self.state.lock().ok()?;
        state.entries.get(key).and_then(|value| value.downcast_ref::<T>()).cloned()
    }

    /// Returns true when a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().is_ok_and(|state| state.entries.contains_key(key))
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    /// Returns true when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::telemetry::NoopEventSink;

    fn cache() -> QueryCache {
        QueryCache::new(Arc::new(NoopEventSink))
    }

    fn key(tag: CacheTag) -> CacheKey {
        CacheKey::new(ProjectId::new("p1"), tag)
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let value = cache
                .get_or_fetch(key(CacheTag::Collections), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ApiError>(vec![1_u8])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1_u8]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_caches_nothing() {
        let cache = cache();
        let records = key(CacheTag::Records("posts".to_string()));
        let err = cache
            .get_or_fetch(records.clone(), || async {
                Err::<u32, _>(ApiError::Transport("down".to_string()))
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Transport("down".to_string()));
        assert!(!cache.contains(&records));

        let value = cache
            .get_or_fetch(records.clone(), || async { Ok::<_, ApiError>(3_u32) })
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert!(cache.contains(&records));
    }

    #[tokio::test]
    async fn result_racing_an_invalidation_is_not_stored() {
        let cache = cache();
        let fields = key(CacheTag::Fields("posts".to_string()));
        let value = cache
            .get_or_fetch(fields.clone(), || async {
                cache.invalidate(&ProjectId::new("p1"), &[CacheTag::Fields("posts".to_string())]);
                Ok::<_, ApiError>("stale".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "stale");
        assert!(!cache.contains(&fields));
    }

    #[tokio::test]
    async fn invalidation_is_scoped_to_project_and_tag() {
        let cache = cache();
        let posts = key(CacheTag::Records("posts".to_string()));
        let other = CacheKey::new(ProjectId::new("p2"), CacheTag::Records("posts".to_string()));
        let collections = key(CacheTag::Collections);
        for entry in [&posts, &other, &collections] {
            cache.get_or_fetch(entry.clone(), || async { Ok::<_, ApiError>(1_u8) }).await.unwrap();
        }

        cache.invalidate(&ProjectId::new("p1"), &[CacheTag::Records("posts".to_string())]);

        assert!(!cache.contains(&posts));
        assert!(cache.contains(&other));
        assert_eq!(cache.peek::<u8>(&collections), Some(1));
    }
}
