//! Folio cache system.
//!
//! A single [`TtlCache`] instance is built at startup and shared (via `Arc`)
//! by the content store and route handlers. Expiry is lazy on read and
//! enforced in bulk by [`CacheSweeper`].
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! default_ttl_seconds = 300
//! sweep_interval_seconds = 60
//! ```

mod config;
pub mod keys;
mod lock;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use keys::{ReadOp, collection_prefix, content_key};
pub use store::{CacheStats, TtlCache};
pub use sweeper::CacheSweeper;

/// The cache flavour shared across the application.
pub type SharedCache = std::sync::Arc<TtlCache<serde_json::Value>>;
