use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct CachedValue<T> {
    loaded_at: Instant,
    value: Arc<T>,
}

/// Single-value cache that reloads once its entry is older than `ttl`.
///
/// There is no explicit invalidation; writes elsewhere become visible only
/// after expiry.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<CachedValue<T>>>,
}

impl<T: Send + Sync> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fresh(&self, cached: &Option<CachedValue<T>>) -> Option<Arc<T>> {
        cached
            .as_ref()
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Return the cached value, calling `load` when it is missing or stale
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Arc<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.fresh(&*self.slot.read().await) {
            return value;
        }

        let mut slot = self.slot.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(value) = self.fresh(&slot) {
            return value;
        }

        let value = Arc::new(load().await);
        *slot = Some(CachedValue {
            loaded_at: Instant::now(),
            value: value.clone(),
        });
        value
    }
}
