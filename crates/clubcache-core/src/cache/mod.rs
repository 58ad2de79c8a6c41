//! In-memory caching primitives shared by every repository.
//!
//! - `CacheKey`: structured keys composed from ordered dimensions
//! - `Freshness`: TTL or until-invalidated validity policies
//! - `CacheEntry`: a cached value with its timestamp
//! - `CacheStore`: entries, in-flight loads and errors for one resource kind
//!
//! Caches live in memory only; nothing survives a restart.

pub mod entry;
pub mod freshness;
pub mod key;
pub mod store;

pub use entry::{age_display, CacheEntry};
pub use freshness::{Freshness, DEFAULT_ENTITY_TTL};
pub use key::CacheKey;
pub use store::{CacheStore, Claim, LoadGuard, Pending};
