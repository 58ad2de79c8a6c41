//! Clubcache core - data access for the club membership and facility-rental backend.
//!
//! Views never talk to the backend directly. They go through a
//! [`DataService`], which owns one caching repository per resource (members,
//! member detail, rented facilities, the facility catalog, facilities by
//! type and waiting lists). Repositories coalesce concurrent loads, keep
//! entries fresh by TTL or until cleared, and accept optimistic updates
//! after successful writes.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, ClubApi};
pub use cache::{CacheKey, Freshness};
pub use config::Config;
pub use error::LoadError;
pub use service::{CacheSettings, DataService};
