//! Facilities rented by a member, keyed by member id and season.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::Repository;
use crate::api::ClubApi;
use crate::cache::{CacheKey, Freshness};
use crate::error::LoadError;
use crate::models::RentedFacility;

pub struct RentedFacilitiesRepository {
    api: Arc<dyn ClubApi>,
    inner: Repository<Vec<RentedFacility>>,
}

impl RentedFacilitiesRepository {
    pub fn new(api: Arc<dyn ClubApi>, ttl: Duration, wait_timeout: Duration) -> Self {
        Self {
            api,
            inner: Repository::new("rented_facilities", Freshness::Ttl(ttl), wait_timeout),
        }
    }

    pub fn key(member_id: i64, season: Option<i64>) -> CacheKey {
        CacheKey::compose([Some(member_id), season])
    }

    pub async fn load(
        &self,
        member_id: i64,
        season: Option<i64>,
        force: bool,
    ) -> Result<Vec<RentedFacility>, LoadError> {
        let api = Arc::clone(&self.api);
        self.inner
            .load(Self::key(member_id, season), force, || async move {
                api.fetch_rented_facilities(member_id, season).await.map_err(LoadError::from)
            })
            .await
    }

    pub fn clear(&self, member_id: Option<i64>) {
        match member_id {
            Some(id) => {
                self.inner.clear(&CacheKey::from(id));
            }
            None => self.inner.clear_all(),
        }
    }

    pub fn add(&self, member_id: i64, season: Option<i64>, rental: RentedFacility) -> bool {
        self.inner
            .mutate(&Self::key(member_id, season), |rentals| rentals.push(rental))
    }

    pub fn update(&self, member_id: i64, season: Option<i64>, rental: RentedFacility) -> bool {
        self.inner.mutate(&Self::key(member_id, season), |rentals| {
            if let Some(existing) = rentals.iter_mut().find(|r| r.id == rental.id) {
                *existing = rental;
            }
        })
    }

    pub fn remove(&self, member_id: i64, season: Option<i64>, rental_id: i64) -> bool {
        self.inner.mutate(&Self::key(member_id, season), |rentals| {
            rentals.retain(|r| r.id != rental_id)
        })
    }

    pub fn rentals(&self, member_id: i64, season: Option<i64>) -> Option<Vec<RentedFacility>> {
        self.inner.data(&Self::key(member_id, season))
    }

    pub fn is_loading(&self, member_id: i64, season: Option<i64>) -> bool {
        self.inner.is_loading(&Self::key(member_id, season))
    }

    pub fn error(&self, member_id: i64, season: Option<i64>) -> Option<String> {
        self.inner.error_message(&Self::key(member_id, season))
    }

    pub fn cache_age(&self, member_id: i64, season: Option<i64>) -> Option<Duration> {
        self.inner.cache_age(&Self::key(member_id, season))
    }

    pub fn count(&self, member_id: i64, season: Option<i64>) -> usize {
        self.rentals(member_id, season).map(|r| r.len()).unwrap_or(0)
    }

    pub fn unpaid(&self, member_id: i64, season: Option<i64>) -> Vec<RentedFacility> {
        self.rentals(member_id, season)
            .unwrap_or_default()
            .into_iter()
            .filter(|r| !r.is_paid())
            .collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::cache::DEFAULT_ENTITY_TTL;
    use crate::repository::DEFAULT_COALESCE_TIMEOUT;
    use crate::testing::{paid, rental, FakeApi};

    fn setup() -> (Arc<FakeApi>, RentedFacilitiesRepository) {
        let api = Arc::new(FakeApi::default());
        api.set_rentals(5, vec![paid(rental(10, 100)), rental(11, 101)]);
        let repo = RentedFacilitiesRepository::new(
            api.clone(),
            DEFAULT_ENTITY_TTL,
            DEFAULT_COALESCE_TIMEOUT,
        );
        (api, repo)
    }

    #[tokio::test]
    async fn test_add_and_remove_after_load() {
        let (api, repo) = setup();
        repo.load(5, Some(2025), false).await.unwrap();

        assert!(repo.add(5, Some(2025), rental(12, 102)));
        assert!(repo.remove(5, Some(2025), 10));

        let ids: Vec<i64> = repo
            .rentals(5, Some(2025))
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![11, 12]);
        assert_eq!(repo.count(5, Some(2025)), 2);
        assert_eq!(api.calls("fetch_rented_facilities"), 1);
    }

    #[tokio::test]
    async fn test_unpaid_projection() {
        let (_api, repo) = setup();
        repo.load(5, None, false).await.unwrap();

        let unpaid = repo.unpaid(5, None);
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].id, 11);
    }

    #[tokio::test]
    async fn test_add_for_unloaded_selector_is_noop() {
        let (_api, repo) = setup();
        repo.load(5, Some(2025), false).await.unwrap();

        assert!(!repo.add(5, Some(2024), rental(12, 102)));
        assert!(repo.rentals(5, Some(2024)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_rentals() {
        let (api, repo) = setup();
        repo.load(5, None, false).await.unwrap();
        tokio::time::advance(DEFAULT_ENTITY_TTL + Duration::from_secs(1)).await;

        api.fail_with(ApiError::ServerError("maintenance".to_string()));
        assert!(repo.load(5, None, true).await.is_err());

        assert_eq!(repo.count(5, None), 2);
        assert_eq!(
            repo.error(5, None).as_deref(),
            Some("Server error: maintenance")
        );

        api.recover();
        repo.load(5, None, false).await.unwrap();
        assert!(repo.error(5, None).is_none());
    }
}
