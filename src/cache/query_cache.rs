// src/cache/query_cache.rs
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Composite cache key: operation name first, then the parameters that
/// change the result (search string, tracking number, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: u64,
}

#[derive(Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<QueryKey, Entry>,
    // prefix -> generation of its latest invalidation
    invalidations: HashMap<QueryKey, u64>,
}

impl CacheState {
    fn is_fresh(&self, key: &QueryKey, entry: &Entry) -> bool {
        self.invalidations
            .iter()
            .all(|(prefix, at)| !key.starts_with(prefix) || *at <= entry.fetched_at)
    }
}

/// Process-wide read cache. Entries never expire on their own; they only go
/// stale when a mutation invalidates a key prefix that covers them.
///
/// Every invalidation bumps a generation counter. An entry remembers the
/// generation at which its fetch *started*, so a fetch that overlaps an
/// invalidation is stored already stale.
#[derive(Default)]
pub struct QueryCache {
    state: Mutex<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generation to hand to [`QueryCache::populate`] once a fetch completes.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn get_fresh<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.get_fresh_entry(key).map(|(value, _)| value)
    }

    /// Like [`QueryCache::get_fresh`], plus the generation the entry was
    /// fetched at. Extending a cached value must populate with that
    /// generation, not a later one, or an invalidation that lands in between
    /// would be masked.
    pub fn get_fresh_entry<T>(&self, key: &QueryKey) -> Option<(T, u64)>
    where
        T: Clone + 'static,
    {
        let state = self.lock();
        let entry = state.entries.get(key)?;
        if !state.is_fresh(key, entry) {
            return None;
        }
        let value = entry.value.downcast_ref::<T>().cloned()?;
        Some((value, entry.fetched_at))
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let state = self.lock();
        state
            .entries
            .get(key)
            .is_some_and(|entry| state.is_fresh(key, entry))
    }

    pub fn populate<T>(&self, key: QueryKey, value: T, started_at: u64)
    where
        T: Send + Sync + 'static,
    {
        self.lock().entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                fetched_at: started_at,
            },
        );
    }

    /// Marks every entry under `prefix` stale and returns how many were hit.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.lock();
        state.generation += 1;
        let generation = state.generation;
        state.invalidations.insert(prefix.clone(), generation);

        let hit = state.entries.keys().filter(|k| k.starts_with(prefix)).count();
        tracing::debug!(prefix = %prefix, generation, hit, "cache invalidated");
        hit
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
