//! Time-boxed memo for refresh results
//!
//! Holds at most one computed value, keyed by a fingerprint of its inputs.
//! An entry is served only while its key matches and its TTL has not run
//! out. The owner decides when to invalidate; dropping the memo never
//! changes results, only how often they are recomputed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::RawResponse;

#[derive(Debug)]
struct MemoEntry<T> {
    key: u64,
    stored_at: Instant,
    value: Arc<T>,
}

/// Single-slot memo with a time-to-live
#[derive(Debug)]
pub struct Memo<T> {
    ttl: Duration,
    entry: Option<MemoEntry<T>>,
    hits: u64,
    misses: u64,
}

impl<T> Memo<T> {
    /// Create an empty memo
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch the stored value if the key matches and it is still fresh
    pub fn get(&mut self, key: u64, now: Instant) -> Option<Arc<T>> {
        let fresh = self.entry.as_ref().and_then(|entry| {
            let age = now.saturating_duration_since(entry.stored_at);
            (entry.key == key && age < self.ttl).then(|| Arc::clone(&entry.value))
        });

        match fresh {
            Some(value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a value, replacing whatever was there
    pub fn insert(&mut self, key: u64, value: T, now: Instant) -> Arc<T> {
        let value = Arc::new(value);
        self.entry = Some(MemoEntry {
            key,
            stored_at: now,
            value: Arc::clone(&value),
        });
        value
    }

    /// Return the fresh value or compute and store a new one
    pub fn get_or_insert_with<F>(&mut self, key: u64, now: Instant, compute: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        match self.get(key, now) {
            Some(value) => value,
            None => self.insert(key, compute(), now),
        }
    }

    /// Forget the stored value
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// (hits, misses) since creation
    pub fn counters(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Content fingerprint of a response set plus any extra key material
pub fn fingerprint<K: Hash>(responses: &[RawResponse], extra: K) -> u64 {
    let mut hasher = DefaultHasher::new();
    responses.len().hash(&mut hasher);
    for response in responses {
        response.timestamp.timestamp_millis().hash(&mut hasher);
        response.numeric_value.map(f64::to_bits).hash(&mut hasher);
    }
    extra.hash(&mut hasher);
    hasher.finish()
}
