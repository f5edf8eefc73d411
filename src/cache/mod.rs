// Cache module for durable TTL-bound caching.
// Stores upstream API payloads so widgets can paint before the network answers.

pub mod entry;
pub mod namespace;
pub mod store;

pub use entry::{CacheEntry, Freshness};
pub use namespace::{Layout, Namespace};
pub use store::{DEFAULT_TTL, PersistentCache};
