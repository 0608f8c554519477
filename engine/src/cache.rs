//! Bounded response cache with least-recently-used eviction.
//!
//! Keys are normalized text (scoped per output contract by the service);
//! values are complete rewrite results. Recency is a monotonic counter
//! bumped on every lookup hit and insert, so "oldest" always means least
//! recently touched, not first inserted.

use std::collections::HashMap;
use tonedown_types::RewriteResult;

/// Capacity observed in the production extension.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
struct Slot {
    result: RewriteResult,
    last_used: u64,
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, Slot>,
    capacity: usize,
    clock: u64,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            clock: 0,
        }
    }

    /// Look up a cached result, refreshing its recency on a hit.
    pub fn lookup(&mut self, key: &str) -> Option<RewriteResult> {
        self.clock += 1;
        let clock = self.clock;
        let slot = self.entries.get_mut(key)?;
        slot.last_used = clock;
        Some(slot.result.clone())
    }

    /// Insert or overwrite an entry, then evict the single least recently
    /// used entry if the capacity is exceeded. The map overshoots by exactly
    /// one entry before eviction fires; it never evicts more than one.
    pub fn insert(&mut self, key: impl Into<String>, result: RewriteResult) {
        self.clock += 1;
        let slot = Slot {
            result,
            last_used: self.clock,
        };
        self.entries.insert(key.into(), slot);
        if self.entries.len() > self.capacity {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by(|(key_a, slot_a), (key_b, slot_b)| {
                slot_a
                    .last_used
                    .cmp(&slot_b.last_used)
                    .then_with(|| key_a.cmp(key_b))
            })
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::debug!(key_chars = key.chars().count(), "evicting least recently used entry");
            self.entries.remove(&key);
        }
    }

    /// Whether a key is present, without refreshing recency.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
