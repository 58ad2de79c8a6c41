//! In-memory cache store for one resource kind.
//!
//! Holds the committed entries, the set of keys with a fetch in flight and
//! the last error recorded per key. Every state change is a short critical
//! section under one lock and bumps a generation counter that observers can
//! subscribe to.
//!
//! Each in-flight key owns a one-shot outcome channel: callers that find a
//! key already loading receive the same result as the caller that started
//! the fetch, without polling.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::error::LoadError;

use super::{CacheEntry, CacheKey, Freshness};

type Outcome<T> = Option<Result<T, LoadError>>;

struct InFlight<T> {
    id: u64,
    outcome: watch::Sender<Outcome<T>>,
    /// Set when the key was invalidated after this load started; its outcome
    /// is handed to the callers waiting on it but never touches the store.
    superseded: bool,
}

impl<T> InFlight<T> {
    fn new(id: u64) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            id,
            outcome,
            superseded: false,
        }
    }
}

struct StoreState<T> {
    entries: HashMap<CacheKey, CacheEntry<T>>,
    in_flight: HashMap<CacheKey, InFlight<T>>,
    /// Superseded loads replaced by a newer load of the same key, by flight id.
    detached: HashMap<u64, InFlight<T>>,
    errors: HashMap<CacheKey, LoadError>,
    next_flight: u64,
}

impl<T> StoreState<T> {
    /// Mark `key` in flight under a new id. A superseded load already in
    /// flight for the key is detached so its waiters still get its outcome.
    fn start_flight(&mut self, key: &CacheKey) -> u64 {
        self.next_flight += 1;
        let id = self.next_flight;
        if let Some(previous) = self.in_flight.insert(key.clone(), InFlight::new(id)) {
            self.detached.insert(previous.id, previous);
        }
        self.errors.remove(key);
        id
    }

    /// Remove the flight `id` of `key`, or the current flight when `id` is None.
    fn take_flight(&mut self, key: &CacheKey, id: Option<u64>) -> Option<InFlight<T>> {
        match id {
            None => self.in_flight.remove(key),
            Some(id) => match self.in_flight.get(key) {
                Some(current) if current.id == id => self.in_flight.remove(key),
                _ => self.detached.remove(&id),
            },
        }
    }

    fn supersede_matching(&mut self, prefix: &CacheKey) {
        for (key, flight) in self.in_flight.iter_mut() {
            if key.starts_with(prefix) {
                flight.superseded = true;
            }
        }
    }
}

/// Result of [`CacheStore::claim`]: what a load for a key should do next.
pub enum Claim<'a, T: Clone> {
    /// A fresh entry exists; here is its data.
    Fresh(T),
    /// Another caller is fetching this key; wait for its outcome.
    Join(Pending<T>),
    /// The key is now marked in flight and the caller must fetch it.
    Fetch(LoadGuard<'a, T>),
}

pub struct CacheStore<T> {
    resource: &'static str,
    state: Mutex<StoreState<T>>,
    changes: watch::Sender<u64>,
}

impl<T: Clone> CacheStore<T> {
    pub fn new(resource: &'static str) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            resource,
            state: Mutex::new(StoreState {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                detached: HashMap::new(),
                errors: HashMap::new(),
                next_flight: 0,
            }),
            changes,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.changes.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    // ===== Reads =====

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        self.lock().entries.get(key).cloned()
    }

    pub fn data(&self, key: &CacheKey) -> Option<T> {
        self.lock().entries.get(key).map(|entry| entry.data.clone())
    }

    pub fn is_fresh(&self, key: &CacheKey, freshness: &Freshness) -> bool {
        self.lock()
            .entries
            .get(key)
            .map(|entry| entry.is_fresh(freshness))
            .unwrap_or(false)
    }

    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    pub fn error(&self, key: &CacheKey) -> Option<LoadError> {
        self.lock().errors.get(key).cloned()
    }

    pub fn age(&self, key: &CacheKey) -> Option<Duration> {
        self.lock().entries.get(key).map(|entry| entry.age())
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver of the store generation, bumped on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn generation(&self) -> u64 {
        *self.changes.borrow()
    }

    // ===== Load lifecycle =====

    /// Decide atomically whether a load for `key` is served from cache,
    /// joins a fetch already in flight, or must fetch itself.
    pub fn claim(&self, key: &CacheKey, freshness: &Freshness, force: bool) -> Claim<'_, T> {
        let mut state = self.lock();

        if !force {
            if let Some(entry) = state.entries.get(key) {
                if entry.is_fresh(freshness) {
                    return Claim::Fresh(entry.data.clone());
                }
            }
        }

        // A load superseded by a clear does not count: joining it would
        // serve data from before the clear.
        if let Some(flight) = state.in_flight.get(key).filter(|f| !f.superseded) {
            return Claim::Join(Pending {
                key: key.clone(),
                outcome: flight.outcome.subscribe(),
            });
        }

        let flight = state.start_flight(key);
        drop(state);
        self.notify();

        Claim::Fetch(LoadGuard {
            store: self,
            key: key.clone(),
            flight,
            settled: false,
        })
    }

    /// Mark `key` in flight and clear its last error. Re-marking is harmless.
    pub fn begin_load(&self, key: &CacheKey) {
        {
            let mut state = self.lock();
            let live = state.in_flight.get(key).is_some_and(|f| !f.superseded);
            if live {
                state.errors.remove(key);
            } else {
                state.start_flight(key);
            }
        }
        self.notify();
    }

    /// Store `data` as the entry for `key` and end its in-flight load.
    pub fn commit(&self, key: &CacheKey, data: T) {
        self.settle(key, None, Ok(data));
    }

    /// Record `error` for `key` and end its in-flight load. Any existing entry is kept.
    pub fn fail(&self, key: &CacheKey, error: LoadError) {
        self.settle(key, None, Err(error));
    }

    fn settle(&self, key: &CacheKey, flight: Option<u64>, outcome: Result<T, LoadError>) {
        {
            let mut state = self.lock();
            let superseded = match state.take_flight(key, flight) {
                Some(flight) => {
                    flight.outcome.send_replace(Some(outcome.clone()));
                    flight.superseded
                }
                None => false,
            };

            if superseded {
                debug!(resource = self.resource, key = %key, "Load superseded by invalidation, not committing");
            } else {
                match outcome {
                    Ok(data) => {
                        state.entries.insert(key.clone(), CacheEntry::new(data));
                        state.errors.remove(key);
                    }
                    Err(error) => {
                        state.errors.insert(key.clone(), error);
                    }
                }
            }
        }
        self.notify();
    }

    /// End an in-flight load that produced no outcome; waiters see `LoadError::Abandoned`.
    fn abandon(&self, key: &CacheKey, flight: u64) {
        let removed = self.lock().take_flight(key, Some(flight)).is_some();
        if removed {
            debug!(resource = self.resource, key = %key, "In-flight load abandoned");
            self.notify();
        }
    }

    // ===== Invalidation and optimistic updates =====

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = {
            let mut state = self.lock();
            if let Some(flight) = state.in_flight.get_mut(key) {
                flight.superseded = true;
            }
            state.entries.remove(key).is_some()
        };
        self.notify();
        removed
    }

    /// Drop every entry whose key starts with `prefix`. Returns how many were dropped.
    pub fn invalidate_prefix(&self, prefix: &CacheKey) -> usize {
        let removed = {
            let mut state = self.lock();
            state.supersede_matching(prefix);
            let before = state.entries.len();
            state.entries.retain(|key, _| !key.starts_with(prefix));
            before - state.entries.len()
        };
        self.notify();
        removed
    }

    pub fn invalidate_all(&self) {
        {
            let mut state = self.lock();
            state.supersede_matching(&CacheKey::root());
            state.entries.clear();
        }
        self.notify();
    }

    /// Replace the entry for `key` with a modified copy stamped now.
    /// Returns false, changing nothing, when there is no entry.
    pub fn mutate<F>(&self, key: &CacheKey, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let replaced = {
            let mut state = self.lock();
            match state.entries.get(key) {
                Some(entry) => {
                    let mut data = entry.data.clone();
                    f(&mut data);
                    state.entries.insert(key.clone(), CacheEntry::new(data));
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.notify();
        }
        replaced
    }

    /// Apply `f` to every entry under `prefix`. Returns how many entries were replaced.
    pub fn mutate_matching<F>(&self, prefix: &CacheKey, mut f: F) -> usize
    where
        F: FnMut(&mut T),
    {
        let replaced = {
            let mut state = self.lock();
            let mut replaced = 0;
            for (_, entry) in state.entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
                let mut data = entry.data.clone();
                f(&mut data);
                *entry = CacheEntry::new(data);
                replaced += 1;
            }
            replaced
        };
        if replaced > 0 {
            self.notify();
        }
        replaced
    }
}

/// A wait on a load started by another caller.
pub struct Pending<T> {
    key: CacheKey,
    outcome: watch::Receiver<Outcome<T>>,
}

impl<T: Clone> Pending<T> {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Resolve with the outcome of the load this handle joined.
    pub async fn wait(self) -> Result<T, LoadError> {
        let Pending { key, mut outcome } = self;
        let abandoned = || LoadError::Abandoned {
            key: key.to_string(),
        };

        let settled = match outcome.wait_for(Option::is_some).await {
            Ok(settled) => settled.clone(),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| Err(abandoned()))
    }
}

/// Ownership of one in-flight load.
///
/// Settle it with [`LoadGuard::commit`] or [`LoadGuard::fail`]. Dropping it
/// unsettled (a cancelled or panicking fetch) clears the in-flight marker so
/// the key can never stay stuck.
pub struct LoadGuard<'a, T: Clone> {
    store: &'a CacheStore<T>,
    key: CacheKey,
    flight: u64,
    settled: bool,
}

impl<T: Clone> LoadGuard<'_, T> {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn commit(mut self, data: T) {
        self.settled = true;
        self.store.settle(&self.key, Some(self.flight), Ok(data));
    }

    pub fn fail(mut self, error: LoadError) {
        self.settled = true;
        self.store.settle(&self.key, Some(self.flight), Err(error));
    }
}

impl<T: Clone> Drop for LoadGuard<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.abandon(&self.key, self.flight);
        }
    }
}
