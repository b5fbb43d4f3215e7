use std::time::Duration;

use cryptopulse_models::{AnalysisResponse, CacheConfig, CoinSymbol};
use tracing::debug;

use crate::memory::MemoryCache;

/// Process-wide cache of finished reports, keyed by lowercase coin symbol.
pub struct AnalysisCache {
    memory: MemoryCache<AnalysisResponse>,
}

impl AnalysisCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            memory: MemoryCache::new(max_capacity, ttl),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_capacity, Duration::from_secs(config.ttl_seconds))
    }

    pub async fn get(&self, coin: &CoinSymbol) -> Option<AnalysisResponse> {
        let key = coin.cache_key();
        let hit = self.memory.get(&key).await;
        debug!(key = %key, hit = hit.is_some(), "Analysis cache lookup");
        hit
    }

    pub async fn insert(&self, coin: &CoinSymbol, response: AnalysisResponse) {
        let key = coin.cache_key();
        debug!(key = %key, "Analysis cache store");
        self.memory.insert(key, response).await;
    }

    /// Number of cached coins (approximate until pending evictions run).
    pub fn len(&self) -> u64 {
        self.memory.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
