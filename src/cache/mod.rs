//! Response cache: canonical keys, store seam, and lookup logic.

mod canonical;
mod memory;
mod response;
mod store;

pub use canonical::{QueryContext, cache_key};
pub use memory::MemoryStore;
pub use response::{CacheConfig, ResponseCache};
pub use store::{CacheEntry, CacheStore};
