//! Durable, ttl-checked metadata cache for Tubegate.

pub mod metadata;
pub mod store;
pub mod types;

pub use metadata::{DEFAULT_TTL_SECS, MetadataCache};
pub use store::{CacheStore, FilesystemStore};
pub use types::CacheEntry;
