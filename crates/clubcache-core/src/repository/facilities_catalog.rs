//! The catalog of facility types. A single unpartitioned entry, fresh until cleared.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::Repository;
use crate::api::ClubApi;
use crate::cache::{CacheKey, Freshness};
use crate::error::LoadError;
use crate::models::FacilityType;

pub struct FacilitiesCatalogRepository {
    api: Arc<dyn ClubApi>,
    inner: Repository<Vec<FacilityType>>,
}

impl FacilitiesCatalogRepository {
    pub fn new(api: Arc<dyn ClubApi>, wait_timeout: Duration) -> Self {
        Self {
            api,
            inner: Repository::new("facilities_catalog", Freshness::UntilInvalidated, wait_timeout),
        }
    }

    pub async fn load(&self, force: bool) -> Result<Vec<FacilityType>, LoadError> {
        let api = Arc::clone(&self.api);
        self.inner
            .load(CacheKey::root(), force, || async move {
                api.fetch_facilities_catalog().await.map_err(LoadError::from)
            })
            .await
    }

    pub fn clear(&self) {
        self.inner.clear_all();
    }

    pub fn catalog(&self) -> Option<Vec<FacilityType>> {
        self.inner.data(&CacheKey::root())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.is_loading(&CacheKey::root())
    }

    pub fn error(&self) -> Option<String> {
        self.inner.error_message(&CacheKey::root())
    }

    pub fn cache_age(&self) -> Option<Duration> {
        self.inner.cache_age(&CacheKey::root())
    }

    pub fn count(&self) -> usize {
        self.catalog().map(|c| c.len()).unwrap_or(0)
    }

    pub fn find(&self, facility_type_id: i64) -> Option<FacilityType> {
        self.catalog()?
            .into_iter()
            .find(|t| t.id == facility_type_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}
