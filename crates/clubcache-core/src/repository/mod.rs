//! Caching repositories, one per remote resource.
//!
//! Each repository wraps a [`Repository`] over its own [`CacheStore`] and
//! exposes the load/clear/mutate contract plus read-only projections for
//! arbitrary keys. Loads are coalesced per key: concurrent callers for a key
//! with no fresh entry share a single remote fetch and see the same outcome.

pub mod facilities_by_type;
pub mod facilities_catalog;
pub mod member_detail;
pub mod members;
pub mod rented_facilities;
pub mod waitlist;

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{age_display, CacheEntry, CacheKey, CacheStore, Claim, Freshness};
use crate::error::LoadError;

pub use facilities_by_type::FacilitiesByTypeRepository;
pub use facilities_catalog::FacilitiesCatalogRepository;
pub use member_detail::MemberDetailRepository;
pub use members::MembersRepository;
pub use rented_facilities::RentedFacilitiesRepository;
pub use waitlist::{join_members, WaitlistRepository};

/// Default deadline for a caller waiting on another caller's fetch.
pub const DEFAULT_COALESCE_TIMEOUT: Duration = Duration::from_secs(60);

/// The load/clear/mutate machinery shared by every resource repository.
pub struct Repository<T: Clone> {
    store: CacheStore<T>,
    freshness: Freshness,
    wait_timeout: Duration,
    current: Mutex<Option<CacheKey>>,
}

impl<T: Clone + Send + Sync> Repository<T> {
    pub fn new(resource: &'static str, freshness: Freshness, wait_timeout: Duration) -> Self {
        Self {
            store: CacheStore::new(resource),
            freshness,
            wait_timeout,
            current: Mutex::new(None),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.store.resource()
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    pub fn store(&self) -> &CacheStore<T> {
        &self.store
    }

    /// Return the data for `key`, fetching it with `fetch` unless a fresh
    /// entry exists (and `force` is false) or a fetch is already in flight.
    ///
    /// A failed fetch is recorded against the key and returned; any
    /// previously cached data for the key is kept.
    pub async fn load<F, Fut>(&self, key: CacheKey, force: bool, fetch: F) -> Result<T, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let resource = self.resource();
        self.set_current(&key);

        match self.store.claim(&key, &self.freshness, force) {
            Claim::Fresh(data) => {
                debug!(resource, key = %key, "Cache hit");
                Ok(data)
            }
            Claim::Join(pending) => {
                debug!(resource, key = %key, "Joining in-flight load");
                match tokio::time::timeout(self.wait_timeout, pending.wait()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(resource, key = %key, "Gave up waiting for in-flight load");
                        Err(LoadError::WaitTimedOut {
                            key: key.to_string(),
                        })
                    }
                }
            }
            Claim::Fetch(guard) => {
                debug!(resource, key = %key, force, "Fetching");
                match fetch().await {
                    Ok(data) => {
                        info!(resource, key = %key, "Fetched");
                        guard.commit(data.clone());
                        Ok(data)
                    }
                    Err(e) => {
                        warn!(resource, key = %key, error = %e, "Fetch failed");
                        guard.fail(e.clone());
                        Err(e)
                    }
                }
            }
        }
    }

    fn set_current(&self, key: &CacheKey) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.clone());
    }

    /// The key most recently passed to `load`.
    pub fn current_key(&self) -> Option<CacheKey> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ===== Projections =====

    pub fn data(&self, key: &CacheKey) -> Option<T> {
        self.store.data(key)
    }

    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        self.store.get(key)
    }

    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.store.is_fresh(key, &self.freshness)
    }

    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.store.is_loading(key)
    }

    pub fn error(&self, key: &CacheKey) -> Option<LoadError> {
        self.store.error(key)
    }

    pub fn error_message(&self, key: &CacheKey) -> Option<String> {
        self.store.error(key).map(|e| e.to_string())
    }

    pub fn cache_age(&self, key: &CacheKey) -> Option<Duration> {
        self.store.age(key)
    }

    pub fn age_display(&self, key: &CacheKey) -> Option<String> {
        self.store.age(key).map(age_display)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    // ===== Invalidation =====

    /// Drop the entry for exactly `key`.
    pub fn clear_entry(&self, key: &CacheKey) -> bool {
        debug!(resource = self.resource(), key = %key, "Clearing cache entry");
        self.store.invalidate(key)
    }

    /// Drop `prefix` and every entry derived from it.
    pub fn clear(&self, prefix: &CacheKey) -> usize {
        debug!(resource = self.resource(), prefix = %prefix, "Clearing cache entries");
        self.store.invalidate_prefix(prefix)
    }

    pub fn clear_all(&self) {
        debug!(resource = self.resource(), "Clearing cache");
        self.store.invalidate_all();
    }

    // ===== Optimistic updates =====

    /// Apply `f` to the entry for `key`. No entry means no change.
    pub fn mutate<F>(&self, key: &CacheKey, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let applied = self.store.mutate(key, f);
        if !applied {
            debug!(resource = self.resource(), key = %key, "No cached entry to update");
        }
        applied
    }

    pub fn mutate_matching<F>(&self, prefix: &CacheKey, f: F) -> usize
    where
        F: FnMut(&mut T),
    {
        self.store.mutate_matching(prefix, f)
    }
}
