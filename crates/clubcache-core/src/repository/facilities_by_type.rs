//! Facilities of one type with their rental status, keyed by type and season.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::Repository;
use crate::api::ClubApi;
use crate::cache::{CacheKey, Freshness};
use crate::error::LoadError;
use crate::models::{FacilityWithStatus, Member};

pub struct FacilitiesByTypeRepository {
    api: Arc<dyn ClubApi>,
    inner: Repository<Vec<FacilityWithStatus>>,
}

impl FacilitiesByTypeRepository {
    pub fn new(api: Arc<dyn ClubApi>, wait_timeout: Duration) -> Self {
        Self {
            api,
            inner: Repository::new("facilities_by_type", Freshness::UntilInvalidated, wait_timeout),
        }
    }

    pub fn key(facility_type_id: i64, season: Option<i64>) -> CacheKey {
        CacheKey::compose([Some(facility_type_id), season])
    }

    pub async fn load(
        &self,
        facility_type_id: i64,
        season: Option<i64>,
        force: bool,
    ) -> Result<Vec<FacilityWithStatus>, LoadError> {
        let api = Arc::clone(&self.api);
        self.inner
            .load(Self::key(facility_type_id, season), force, || async move {
                api.fetch_facilities_by_type(facility_type_id, season)
                    .await
                    .map_err(LoadError::from)
            })
            .await
    }

    /// Clear every season cached for a type, or everything when None.
    pub fn clear(&self, facility_type_id: Option<i64>) {
        match facility_type_id {
            Some(id) => {
                self.inner.clear(&CacheKey::from(id));
            }
            None => self.inner.clear_all(),
        }
    }

    pub fn facilities(
        &self,
        facility_type_id: i64,
        season: Option<i64>,
    ) -> Option<Vec<FacilityWithStatus>> {
        self.inner.data(&Self::key(facility_type_id, season))
    }

    pub fn is_loading(&self, facility_type_id: i64, season: Option<i64>) -> bool {
        self.inner.is_loading(&Self::key(facility_type_id, season))
    }

    pub fn error(&self, facility_type_id: i64, season: Option<i64>) -> Option<String> {
        self.inner.error_message(&Self::key(facility_type_id, season))
    }

    pub fn cache_age(&self, facility_type_id: i64, season: Option<i64>) -> Option<Duration> {
        self.inner.cache_age(&Self::key(facility_type_id, season))
    }

    pub fn count(&self, facility_type_id: i64, season: Option<i64>) -> usize {
        self.facilities(facility_type_id, season)
            .map(|f| f.len())
            .unwrap_or(0)
    }

    pub fn available(&self, facility_type_id: i64, season: Option<i64>) -> Vec<FacilityWithStatus> {
        self.filtered(facility_type_id, season, |f| !f.is_rented)
    }

    pub fn rented(&self, facility_type_id: i64, season: Option<i64>) -> Vec<FacilityWithStatus> {
        self.filtered(facility_type_id, season, |f| f.is_rented)
    }

    fn filtered<P>(&self, facility_type_id: i64, season: Option<i64>, predicate: P) -> Vec<FacilityWithStatus>
    where
        P: Fn(&FacilityWithStatus) -> bool,
    {
        self.facilities(facility_type_id, season)
            .unwrap_or_default()
            .into_iter()
            .filter(|f| predicate(f))
            .collect()
    }

    /// Mark `facility_id` rented by `member` in every cached season of its type.
    /// Returns how many cached lists were updated.
    pub fn mark_rented(
        &self,
        facility_type_id: i64,
        facility_id: i64,
        member: &Member,
        expires_at: Option<String>,
    ) -> usize {
        self.inner
            .mutate_matching(&CacheKey::from(facility_type_id), |facilities| {
                if let Some(facility) = facilities.iter_mut().find(|f| f.id == facility_id) {
                    facility.is_rented = true;
                    facility.expires_at = expires_at.clone();
                    facility.rented_by_member_id = Some(member.id);
                    facility.rented_by_member_first_name = Some(member.first_name.clone());
                    facility.rented_by_member_last_name = Some(member.last_name.clone());
                }
            })
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DEFAULT_COALESCE_TIMEOUT;
    use crate::testing::{facility, member, FakeApi};

    fn setup() -> (Arc<FakeApi>, FacilitiesByTypeRepository) {
        let api = Arc::new(FakeApi::default());
        let mut taken = facility(2, 1, "B-02");
        taken.is_rented = true;
        api.set_facilities(vec![facility(1, 1, "B-01"), taken, facility(3, 2, "L-01")]);
        let repo = FacilitiesByTypeRepository::new(api.clone(), DEFAULT_COALESCE_TIMEOUT);
        (api, repo)
    }

    #[tokio::test]
    async fn test_available_and_rented_projections() {
        let (_api, repo) = setup();
        repo.load(1, Some(2025), false).await.unwrap();

        assert_eq!(repo.count(1, Some(2025)), 2);
        assert_eq!(repo.available(1, Some(2025)).len(), 1);
        assert_eq!(repo.rented(1, Some(2025))[0].identifier, "B-02");
        assert!(repo.facilities(2, Some(2025)).is_none());
    }

    #[tokio::test]
    async fn test_mark_rented_updates_cached_seasons() {
        let (api, repo) = setup();
        repo.load(1, Some(2025), false).await.unwrap();

        let renter = member(5, "Jo", "Lee");
        assert_eq!(repo.mark_rented(1, 1, &renter, Some("2026-03-31".to_string())), 1);
        assert_eq!(repo.mark_rented(2, 3, &renter, None), 0);

        let berth = repo
            .facilities(1, Some(2025))
            .unwrap()
            .into_iter()
            .find(|f| f.id == 1)
            .unwrap();
        assert!(berth.is_rented);
        assert_eq!(berth.renter_name().as_deref(), Some("Jo Lee"));
        assert!(repo.available(1, Some(2025)).is_empty());
        assert_eq!(api.calls("fetch_facilities_by_type"), 1);
    }
}
