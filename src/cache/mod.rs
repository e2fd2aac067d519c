//! Vetrina cache system.
//!
//! A single-layer TTL cache for dashboard query results. Entries are
//! idempotently recomputable, so losing the cache only costs recomputation.
//!
//! Behavior is controlled via `vetrina.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 10
//! sweep_interval_seconds = 60
//! ```

mod config;
pub mod keys;
mod store;

pub use config::CacheConfig;
pub use store::{Cache, CacheStore, MemoryStore, NoopStore};
