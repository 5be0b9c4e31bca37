//! Cache Module
//!
//! Read-through cache plumbing: digest key derivation, a bounded TTL/LRU
//! store, and the service wrapper that accounts hits and misses.

mod entry;
mod keys;
mod lru;
mod service;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use keys::{derive_key, KEY_LENGTH};
pub use lru::LruTracker;
pub use service::{CacheService, DEFAULT_TTL};
pub use store::{CacheStore, MemoryStore};

// == Public Constants ==
/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
