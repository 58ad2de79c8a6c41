//! Members list per season.
//!
//! Entries stay fresh until cleared: the list only changes through writes
//! this client makes, which either update the cache or clear it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::Repository;
use crate::api::ClubApi;
use crate::cache::{CacheKey, Freshness};
use crate::error::LoadError;
use crate::models::{Member, MembershipStatus};

pub struct MembersRepository {
    api: Arc<dyn ClubApi>,
    inner: Repository<Vec<Member>>,
}

impl MembersRepository {
    pub fn new(api: Arc<dyn ClubApi>, wait_timeout: Duration) -> Self {
        Self {
            api,
            inner: Repository::new("members", Freshness::UntilInvalidated, wait_timeout),
        }
    }

    /// Members of `season`; no season means the backend's default list.
    pub fn key(season: Option<i64>) -> CacheKey {
        CacheKey::compose([season])
    }

    pub async fn load(&self, season: Option<i64>, force: bool) -> Result<Vec<Member>, LoadError> {
        let api = Arc::clone(&self.api);
        self.inner
            .load(Self::key(season), force, || async move {
                api.fetch_members(season).await.map_err(LoadError::from)
            })
            .await
    }

    /// Clear one season's list, or every list when `season` is None.
    pub fn clear(&self, season: Option<i64>) {
        match season {
            Some(_) => {
                self.inner.clear_entry(&Self::key(season));
            }
            None => self.inner.clear_all(),
        }
    }

    /// Clear exactly one partition; `None` is the unseasoned list only.
    pub fn clear_entry(&self, season: Option<i64>) -> bool {
        self.inner.clear_entry(&Self::key(season))
    }

    pub fn add(&self, season: Option<i64>, member: Member) -> bool {
        self.inner
            .mutate(&Self::key(season), |members| members.push(member))
    }

    /// Replace the cached member with the same id.
    pub fn update(&self, season: Option<i64>, member: Member) -> bool {
        self.inner.mutate(&Self::key(season), |members| {
            if let Some(existing) = members.iter_mut().find(|m| m.id == member.id) {
                *existing = member;
            }
        })
    }

    pub fn remove(&self, season: Option<i64>, member_id: i64) -> bool {
        self.inner.mutate(&Self::key(season), |members| {
            members.retain(|m| m.id != member_id)
        })
    }

    pub fn members(&self, season: Option<i64>) -> Option<Vec<Member>> {
        self.inner.data(&Self::key(season))
    }

    pub fn is_loading(&self, season: Option<i64>) -> bool {
        self.inner.is_loading(&Self::key(season))
    }

    pub fn error(&self, season: Option<i64>) -> Option<String> {
        self.inner.error_message(&Self::key(season))
    }

    pub fn cache_age(&self, season: Option<i64>) -> Option<Duration> {
        self.inner.cache_age(&Self::key(season))
    }

    pub fn age_display(&self, season: Option<i64>) -> Option<String> {
        self.inner.age_display(&Self::key(season))
    }

    pub fn member_by_id(&self, season: Option<i64>, member_id: i64) -> Option<Member> {
        self.members(season)?
            .into_iter()
            .find(|m| m.id == member_id)
    }

    pub fn count(&self, season: Option<i64>) -> usize {
        self.members(season).map(|m| m.len()).unwrap_or(0)
    }

    pub fn by_status(&self, season: Option<i64>, status: MembershipStatus) -> Vec<Member> {
        self.members(season)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.membership_status == Some(status))
            .collect()
    }

    /// Season of the most recent load.
    pub fn current_season(&self) -> Option<i64> {
        self.inner.current_key().and_then(|key| key.dimension(0))
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DEFAULT_COALESCE_TIMEOUT;
    use crate::testing::{member, FakeApi};

    fn setup() -> (Arc<FakeApi>, MembersRepository) {
        let api = Arc::new(FakeApi::default());
        api.set_members(vec![member(1, "Ana", "Kos"), member(2, "Ivo", "Bral")]);
        let repo = MembersRepository::new(api.clone(), DEFAULT_COALESCE_TIMEOUT);
        (api, repo)
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_stays_cached_until_cleared() {
        let (api, repo) = setup();

        repo.load(Some(2025), false).await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400)).await;
        repo.load(Some(2025), false).await.unwrap();
        assert_eq!(api.calls("fetch_members"), 1);

        repo.clear(Some(2025));
        assert!(repo.members(Some(2025)).is_none());
        repo.load(Some(2025), false).await.unwrap();
        assert_eq!(api.calls("fetch_members"), 2);
    }

    #[tokio::test]
    async fn test_seasons_are_separate_partitions() {
        let (api, repo) = setup();

        repo.load(None, false).await.unwrap();
        repo.load(Some(2025), false).await.unwrap();
        assert_eq!(api.calls("fetch_members"), 2);
        assert_eq!(repo.current_season(), Some(2025));

        repo.clear(None);
        assert!(repo.members(None).is_none());
        assert!(repo.members(Some(2025)).is_none());
    }

    #[tokio::test]
    async fn test_clear_entry_keeps_other_seasons() {
        let (api, repo) = setup();
        repo.load(None, false).await.unwrap();
        repo.load(Some(2025), false).await.unwrap();

        assert!(repo.clear_entry(None));
        assert!(repo.members(None).is_none());
        assert_eq!(repo.count(Some(2025)), 2);
        assert!(!repo.clear_entry(Some(2024)));

        repo.load(None, false).await.unwrap();
        assert_eq!(api.calls("fetch_members"), 3);
    }

    #[tokio::test]
    async fn test_optimistic_add_update_remove() {
        let (api, repo) = setup();
        repo.load(Some(2025), false).await.unwrap();

        assert!(repo.add(Some(2025), member(3, "Eva", "Mar")));
        let mut renamed = member(1, "Anja", "Kos");
        renamed.membership_status = Some(MembershipStatus::Active);
        assert!(repo.update(Some(2025), renamed));
        assert!(repo.remove(Some(2025), 2));

        let members = repo.members(Some(2025)).unwrap();
        let names: Vec<String> = members.iter().map(|m| m.full_name()).collect();
        assert_eq!(names, vec!["Anja Kos", "Eva Mar"]);
        assert_eq!(repo.by_status(Some(2025), MembershipStatus::Active).len(), 1);
        assert_eq!(api.calls("fetch_members"), 1);
    }

    #[tokio::test]
    async fn test_add_without_loaded_list_is_noop() {
        let (_api, repo) = setup();

        assert!(!repo.add(Some(2024), member(3, "Eva", "Mar")));
        assert!(repo.members(Some(2024)).is_none());
        assert_eq!(repo.count(Some(2024)), 0);
    }

    #[tokio::test]
    async fn test_member_by_id() {
        let (_api, repo) = setup();
        repo.load(None, false).await.unwrap();

        assert_eq!(repo.member_by_id(None, 2).map(|m| m.first_name), Some("Ivo".to_string()));
        assert!(repo.member_by_id(None, 9).is_none());
    }
}
