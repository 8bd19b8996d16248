//! Resource query cache.
//!
//! One authoritative entry per (resource kind, identifier) key, with:
//!
//! - **single-flight reads**: concurrent resolvers of the same key share one
//!   underlying fetch;
//! - **write-through mutations**: a successful write replaces the entry
//!   before the mutation call returns, so readers observe the latest value
//!   without a redundant round-trip;
//! - **TTL freshness** and **LRU capacity eviction**, configured via
//!   `ammesso.toml`:
//!
//! ```toml
//! [cache]
//! school_limit = 64
//! season_limit = 16
//! stale_after_ms = 30000
//! ```
//!
//! Failures are never cached and the cache itself never retries; a resolve
//! after a failure issues a fresh fetch.

mod config;
mod lock;
mod query;
mod store;

pub use config::CacheConfig;
pub use query::{QueryState, ResourceCache};
pub use store::EntryStore;
