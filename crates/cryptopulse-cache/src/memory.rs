use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tokio::time::Instant;

#[derive(Clone)]
struct Stamped<V> {
    value: V,
    inserted_at: Instant,
}

/// In-memory hot cache backed by moka.
///
/// Capacity is bounded with least-recently-used eviction. Every entry is
/// stamped with its insertion instant from the tokio clock and stops being
/// served once `ttl` has elapsed, so expiry follows a paused test clock too.
/// moka's own time-to-live reaps expired entries in the background.
pub struct MemoryCache<V> {
    inner: Cache<String, Stamped<V>>,
    ttl: Duration,
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let entry = self.inner.get(key).await?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value)
    }

    pub async fn insert(&self, key: String, value: V) {
        let entry = Stamped {
            value,
            inserted_at: Instant::now(),
        };
        self.inner.insert(key, entry).await;
    }

    /// Applies pending evictions so `entry_count` is exact.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
