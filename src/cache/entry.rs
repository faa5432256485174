//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with a fixed lifetime.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cached value plus the metadata needed to expire it.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion instant
    pub inserted_at: Instant,
    /// Lifetime measured from `inserted_at`
    pub expires_after: Duration,
    /// Identifies this insertion; expiry actions only remove a matching generation
    pub generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry inserted now.
    pub fn new(value: V, expires_after: Duration, generation: u64) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            expires_after,
            generation,
        }
    }

    /// Instant at which the entry stops being served.
    pub fn deadline(&self) -> Instant {
        self.inserted_at + self.expires_after
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its lifetime.
    ///
    /// The entry is expired once the current time is greater than or equal
    /// to its deadline.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline()
    }
}
