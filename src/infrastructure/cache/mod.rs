//! Persistent cache store adapters.

pub mod disk_store;
pub mod memory_store;

pub use disk_store::{DEFAULT_MAX_STORE_SIZE, DiskCacheStore};
pub use memory_store::MemoryCacheStore;
