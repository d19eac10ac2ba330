//! TTL-bounded memoisation of decision results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::pdp::CheckResult;

struct CacheEntry {
    result: CheckResult,
    inserted_at: Instant,
}

/// Process-local decision cache keyed by request fingerprint.
///
/// Readers share a read lock and never block each other; writers are
/// serialised. Expiry is lazy: an entry past its TTL is simply not returned,
/// and `purge_expired` can reclaim memory when a caller cares to.
pub struct DecisionCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl DecisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a live entry; expired entries read as misses.
    pub async fn get(&self, key: &str) -> Option<CheckResult> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.result.clone())
    }

    /// Store a result, unconditionally replacing any prior entry.
    pub async fn set(&self, key: String, result: CheckResult) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdp::Decision;

    fn result(allow: bool) -> CheckResult {
        CheckResult {
            allow,
            decision: if allow { Decision::Role } else { Decision::Deny },
            role_keys: vec![],
            correlation_id: None,
        }
    }

    #[tokio::test]
    async fn test_get_returns_live_entry() {
        let cache = DecisionCache::new(Duration::from_secs(60));
        cache.set("k".into(), result(true)).await;
        assert_eq!(cache.get("k").await, Some(result(true)));
    }

    #[tokio::test]
    async fn test_missing_key_is_a_miss() {
        let cache = DecisionCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("absent").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = DecisionCache::new(Duration::from_millis(20));
        cache.set("k".into(), result(true)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_set_replaces_prior_entry() {
        let cache = DecisionCache::new(Duration::from_secs(60));
        cache.set("k".into(), result(true)).await;
        cache.set("k".into(), result(false)).await;
        assert_eq!(cache.get("k").await, Some(result(false)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_reclaims_entries() {
        let cache = DecisionCache::new(Duration::from_millis(20));
        cache.set("a".into(), result(true)).await;
        cache.set("b".into(), result(false)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.set("c".into(), result(true)).await;

        cache.purge_expired().await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("c").await, Some(result(true)));
    }

    #[tokio::test]
    async fn test_concurrent_readers() {
        let cache = std::sync::Arc::new(DecisionCache::new(Duration::from_secs(60)));
        cache.set("k".into(), result(true)).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    assert!(cache.get("k").await.is_some());
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
