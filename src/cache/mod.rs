//! Cache Module
//!
//! Bounded in-memory cache with per-entry expiry, plus the structured keys
//! and typed values the service layer stores in it.

mod entry;
mod keys;
mod stats;
mod store;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use keys::{CacheKey, FamilyKey, KeyFamily};
pub use stats::CacheStats;
pub use store::BoundedTtlCache;
pub use value::{Cacheable, CachedValue};

/// Cache instance shared by all services.
pub type ServiceCache = BoundedTtlCache<CacheKey, CachedValue>;
