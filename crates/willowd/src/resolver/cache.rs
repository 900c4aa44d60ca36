//! Short-lived classification cache (resolver tier 1).

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use willow_common::Classification;

#[derive(Debug, Clone)]
struct CacheEntry {
    classification: Classification,
    inserted_at: Instant,
}

/// LRU-based classification cache with TTL.
///
/// Keys are normalized message texts. Capacity overflow evicts the oldest
/// entry; reads past the TTL drop the entry and report a miss.
pub struct ClassificationCache {
    cache: Arc<Mutex<LruCache<String, CacheEntry>>>,
    ttl: Duration,
}

impl ClassificationCache {
    /// Create a cache holding at most `capacity` entries for `ttl` each
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cache = LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap());
        Self {
            cache: Arc::new(Mutex::new(cache)),
            ttl,
        }
    }

    /// Look up a normalized message, honoring the TTL
    pub async fn get(&self, key: &str) -> Option<Classification> {
        let mut cache = self.cache.lock().await;
        let now = Instant::now();

        if let Some(entry) = cache.get(key) {
            if now.duration_since(entry.inserted_at) < self.ttl {
                return Some(entry.classification.clone());
            }
            cache.pop(key);
        }
        None
    }

    /// Store a classification for a normalized message
    pub async fn put(&self, key: &str, classification: Classification) {
        let mut cache = self.cache.lock().await;
        cache.put(
            key.to_string(),
            CacheEntry {
                classification,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries (called periodically)
    pub async fn prune_expired(&self) {
        let mut cache = self.cache.lock().await;
        let now = Instant::now();

        let expired_keys: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.inserted_at) >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired_keys {
            cache.pop(&key);
        }
    }

    /// Current cache size
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use willow_common::SourceTier;

    fn classification() -> Classification {
        Classification {
            intent: "greeting".to_string(),
            confidence: 0.7,
            response_type: "greeting".to_string(),
            source_tier: SourceTier::KeywordRule,
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = ClassificationCache::new(16, Duration::from_secs(60));
        assert!(cache.get("hello").await.is_none());

        cache.put("hello", classification()).await;
        let hit = cache.get("hello").await.unwrap();
        assert_eq!(hit.intent, "greeting");
    }

    #[tokio::test]
    async fn test_expiration() {
        let cache = ClassificationCache::new(16, Duration::from_millis(20));
        cache.put("hello", classification()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("hello").await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let cache = ClassificationCache::new(2, Duration::from_secs(60));
        cache.put("a", classification()).await;
        cache.put("b", classification()).await;
        cache.put("c", classification()).await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let cache = ClassificationCache::new(16, Duration::from_millis(10));
        cache.put("a", classification()).await;
        cache.put("b", classification()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.prune_expired().await;
        assert_eq!(cache.len().await, 0);
    }
}
