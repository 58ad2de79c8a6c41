//! Validity policies for cached entries.

use std::time::Duration;

/// Default lifetime of per-entity entries (member detail, rented facilities).
pub const DEFAULT_ENTITY_TTL: Duration = Duration::from_secs(5 * 60);

/// How long a cached entry may be served without a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Fresh while younger than the given age.
    Ttl(Duration),
    /// Fresh as long as it exists; only an explicit clear expires it.
    UntilInvalidated,
}

impl Freshness {
    pub fn admits(&self, age: Duration) -> bool {
        match self {
            Freshness::Ttl(ttl) => age < *ttl,
            Freshness::UntilInvalidated => true,
        }
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Freshness::Ttl(DEFAULT_ENTITY_TTL)
    }
}
