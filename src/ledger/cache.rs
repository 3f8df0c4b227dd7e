//! Short-lived derived-value caches
//!
//! A slot holds one value stamped with the instant it was computed. Reads
//! within the validity window reuse it; anything older is recomputed.
//! Invalidation just empties the slot, so doing it twice is harmless.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct TimedCache<T> {
    ttl: Duration,
    slot: Mutex<Option<(T, Instant)>>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value, or compute, store and return a fresh one
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((value, computed_at)) = slot.as_ref() {
            if computed_at.elapsed() < self.ttl {
                return value.clone();
            }
        }

        let value = compute();
        *slot = Some((value.clone(), Instant::now()));
        value
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub fn is_warm(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        matches!(slot.as_ref(), Some((_, at)) if at.elapsed() < self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_reuses_value_within_window() {
        let cache = TimedCache::new(Duration::from_secs(300));
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            42
        };

        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(calls.get(), 1);
        assert!(cache.is_warm());
    }

    #[test]
    fn test_double_invalidate_is_noop() {
        let cache = TimedCache::new(Duration::from_secs(300));
        cache.invalidate();
        cache.invalidate();
        assert!(!cache.is_warm());
        assert_eq!(cache.get_or_compute(|| 7), 7);

        cache.invalidate();
        cache.invalidate();
        assert_eq!(cache.get_or_compute(|| 7), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_window() {
        let cache = TimedCache::new(Duration::from_secs(300));
        assert_eq!(cache.get_or_compute(|| 1), 1);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get_or_compute(|| 2), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get_or_compute(|| 3), 3);
    }
}
