//! Full member records, keyed by member id and season.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::Repository;
use crate::api::ClubApi;
use crate::cache::{CacheKey, Freshness};
use crate::error::LoadError;
use crate::models::MemberDetail;

pub struct MemberDetailRepository {
    api: Arc<dyn ClubApi>,
    inner: Repository<MemberDetail>,
}

impl MemberDetailRepository {
    pub fn new(api: Arc<dyn ClubApi>, ttl: Duration, wait_timeout: Duration) -> Self {
        Self {
            api,
            inner: Repository::new("member_detail", Freshness::Ttl(ttl), wait_timeout),
        }
    }

    pub fn key(member_id: i64, season: Option<i64>) -> CacheKey {
        CacheKey::compose([Some(member_id), season])
    }

    /// A member that does not exist fails with a not-found error (see `LoadError::is_not_found`).
    pub async fn load(
        &self,
        member_id: i64,
        season: Option<i64>,
        force: bool,
    ) -> Result<MemberDetail, LoadError> {
        let api = Arc::clone(&self.api);
        self.inner
            .load(Self::key(member_id, season), force, || async move {
                api.fetch_member_detail(member_id, season).await.map_err(LoadError::from)
            })
            .await
    }

    /// Clear every season cached for `member_id`, or everything when None.
    pub fn clear(&self, member_id: Option<i64>) {
        match member_id {
            Some(id) => {
                self.inner.clear(&CacheKey::from(id));
            }
            None => self.inner.clear_all(),
        }
    }

    pub fn clear_entry(&self, member_id: i64, season: Option<i64>) -> bool {
        self.inner.clear_entry(&Self::key(member_id, season))
    }

    /// Replace the cached record for `detail.id` in `season` after a write.
    pub fn update(&self, season: Option<i64>, detail: MemberDetail) -> bool {
        self.inner
            .mutate(&Self::key(detail.id, season), |cached| *cached = detail)
    }

    pub fn detail(&self, member_id: i64, season: Option<i64>) -> Option<MemberDetail> {
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

    pub fn is_fresh(&self, member_id: i64, season: Option<i64>) -> bool {
        self.inner.is_fresh(&Self::key(member_id, season))
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}
