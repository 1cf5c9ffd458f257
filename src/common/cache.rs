//! In-memory cache for storing key-value pairs.
//!
//! Uses moka's high-performance concurrent cache implementation.

use moka::sync::Cache;

/// Thread-safe in-memory cache with configurable capacity.
///
/// Used for storing:
/// - Deployed workflows (`MemCache<String, Arc<Workflow>>`)
/// - Cancellation tokens of active runs (`MemCache<ExecutionId, CancellationToken>`)
/// - Latest published execution snapshots (`MemCache<ExecutionId, WorkflowExecution>`)
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Allocate a new [`MemCache`].
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity as u64),
        }
    }

    /// Insert or replace the value stored under `key`.
    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    /// Get the value stored under `key`.
    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    /// Remove the value stored under `key`.
    pub fn remove(
        &self,
        key: &K,
    ) {
        self.entries.invalidate(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let cache: MemCache<String, u32> = MemCache::new(16);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        cache.set("a".to_string(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(2));

        cache.remove(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
    }
}
