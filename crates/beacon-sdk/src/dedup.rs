//! Time-windowed deduplication cache.
//!
//! Suppresses repeated fingerprints inside a trailing window, with a hard
//! capacity bound enforced by strict FIFO-by-insertion eviction. This is a
//! capacity guard against unbounded growth under many distinct error
//! shapes, not a recency cache: re-accepting a resident fingerprint keeps
//! its original queue position, so callers must not assume LRU semantics.

use std::collections::{HashMap, VecDeque};

/// Trailing window during which a repeated fingerprint is suppressed.
pub const DEDUP_WINDOW_MS: u64 = 10_000;

/// Maximum number of resident fingerprints.
pub const MAX_FINGERPRINTS: usize = 500;

/// Bounded fingerprint -> last-accepted-timestamp cache.
#[derive(Debug)]
pub struct DedupCache {
    window_ms: u64,
    capacity: usize,
    last_seen: HashMap<String, u64>,
    insertion_order: VecDeque<String>,
}

impl DedupCache {
    /// Create a cache with the default window and capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEDUP_WINDOW_MS, MAX_FINGERPRINTS)
    }

    /// Create a cache with explicit limits.
    #[must_use]
    pub fn with_limits(window_ms: u64, capacity: usize) -> Self {
        Self {
            window_ms,
            capacity,
            last_seen: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    /// Decide whether a fingerprint should be suppressed at `now_ms`.
    ///
    /// Returns `true` (suppress) when the fingerprint was accepted within
    /// the window; the stored timestamp is not touched in that case.
    /// Otherwise records the fingerprint at `now_ms` and returns `false`
    /// (accept), evicting the single oldest-inserted entry if the capacity
    /// is exceeded.
    pub fn should_suppress(&mut self, fingerprint: &str, now_ms: u64) -> bool {
        if let Some(&last) = self.last_seen.get(fingerprint) {
            if now_ms.saturating_sub(last) < self.window_ms {
                return true;
            }
        }

        if self.last_seen.insert(fingerprint.to_owned(), now_ms).is_none() {
            self.insertion_order.push_back(fingerprint.to_owned());
        }

        if self.last_seen.len() > self.capacity {
            if let Some(oldest) = self.insertion_order.pop_front() {
                self.last_seen.remove(&oldest);
            }
        }

        false
    }

    /// Number of resident fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// Whether a fingerprint is currently resident.
    #[must_use]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.last_seen.contains_key(fingerprint)
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_inside_window_is_suppressed() {
        let mut cache = DedupCache::new();
        assert!(!cache.should_suppress("boom:", 1_000));
        assert!(cache.should_suppress("boom:", 1_000 + DEDUP_WINDOW_MS - 1));
    }

    #[test]
    fn repeat_after_window_is_accepted() {
        let mut cache = DedupCache::new();
        assert!(!cache.should_suppress("boom:", 1_000));
        assert!(!cache.should_suppress("boom:", 1_000 + DEDUP_WINDOW_MS));
    }

    #[test]
    fn suppression_does_not_extend_the_window() {
        let mut cache = DedupCache::new();
        assert!(!cache.should_suppress("boom:", 0));
        // Suppressed repeat must not refresh the stored timestamp.
        assert!(cache.should_suppress("boom:", 5_000));
        assert!(!cache.should_suppress("boom:", DEDUP_WINDOW_MS));
    }

    #[test]
    fn capacity_overflow_evicts_exactly_the_oldest() {
        let mut cache = DedupCache::new();
        for i in 0..=MAX_FINGERPRINTS {
            assert!(!cache.should_suppress(&format!("fp-{i}"), 0));
        }
        assert_eq!(cache.len(), MAX_FINGERPRINTS);
        assert!(!cache.contains("fp-0"));
        assert!(cache.contains("fp-1"));
        assert!(cache.contains(&format!("fp-{MAX_FINGERPRINTS}")));
    }

    #[test]
    fn eviction_is_fifo_by_insertion_not_lru() {
        let mut cache = DedupCache::with_limits(DEDUP_WINDOW_MS, 2);
        assert!(!cache.should_suppress("a", 0));
        assert!(!cache.should_suppress("b", 0));
        // Re-accept "a" after the window; it keeps its insertion position.
        assert!(!cache.should_suppress("a", DEDUP_WINDOW_MS));
        assert!(!cache.should_suppress("c", DEDUP_WINDOW_MS));
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn evicted_fingerprint_reinserts_at_the_back() {
        let mut cache = DedupCache::with_limits(DEDUP_WINDOW_MS, 2);
        assert!(!cache.should_suppress("a", 0));
        assert!(!cache.should_suppress("b", 0));
        assert!(!cache.should_suppress("c", 0)); // evicts "a"
        assert!(!cache.should_suppress("a", 0)); // fresh insertion, evicts "b"
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }
}
