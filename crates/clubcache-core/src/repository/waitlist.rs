//! Facility waiting lists joined against the member list.
//!
//! Raw entries only carry member ids. A load first makes sure the current
//! season's members are cached, then resolves each entry's name and email
//! from that list. An entry whose member is not in the list keeps a
//! placeholder name instead of failing the load.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::debug;

use super::{MembersRepository, Repository};
use crate::api::ClubApi;
use crate::cache::{CacheKey, Freshness};
use crate::error::LoadError;
use crate::models::{Member, Season, WaitlistEntry, WaitlistMemberDetail};

pub const UNKNOWN_MEMBER: &str = "Unknown Member";

/// Attach member names, emails and 1-based queue positions to raw entries, in order.
pub fn join_members(entries: &[WaitlistEntry], members: &[Member]) -> Vec<WaitlistMemberDetail> {
    let by_id: HashMap<i64, &Member> = members.iter().map(|m| (m.id, m)).collect();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| enrich(entry.clone(), by_id.get(&entry.member_id).copied(), index + 1))
        .collect()
}

fn enrich(entry: WaitlistEntry, member: Option<&Member>, position: usize) -> WaitlistMemberDetail {
    WaitlistMemberDetail {
        member_name: member
            .map(|m| m.full_name())
            .unwrap_or_else(|| UNKNOWN_MEMBER.to_string()),
        member_email: member.and_then(|m| m.email.clone()).unwrap_or_default(),
        position,
        entry,
    }
}

pub struct WaitlistRepository {
    api: Arc<dyn ClubApi>,
    members: Arc<MembersRepository>,
    inner: Repository<Vec<WaitlistMemberDetail>>,
}

impl WaitlistRepository {
    pub fn new(api: Arc<dyn ClubApi>, members: Arc<MembersRepository>, wait_timeout: Duration) -> Self {
        Self {
            api,
            members,
            inner: Repository::new("waitlist", Freshness::UntilInvalidated, wait_timeout),
        }
    }

    pub fn key(facility_type_id: i64) -> CacheKey {
        CacheKey::from(facility_type_id)
    }

    fn member_season() -> i64 {
        Season::current(Local::now().date_naive()).id
    }

    pub async fn load(
        &self,
        facility_type_id: i64,
        force: bool,
    ) -> Result<Vec<WaitlistMemberDetail>, LoadError> {
        let api = Arc::clone(&self.api);
        let members = Arc::clone(&self.members);
        self.inner
            .load(Self::key(facility_type_id), force, || async move {
                let roster = members.load(Some(Self::member_season()), false).await?;
                let response = api.fetch_waitlist(facility_type_id).await?;
                debug!(
                    facility_type_id,
                    entries = response.entries.len(),
                    members = roster.len(),
                    "Joining waitlist against members"
                );
                Ok::<_, LoadError>(join_members(&response.entries, &roster))
            })
            .await
    }

    pub fn clear(&self, facility_type_id: Option<i64>) {
        match facility_type_id {
            Some(id) => {
                self.inner.clear_entry(&Self::key(id));
            }
            None => self.inner.clear_all(),
        }
    }

    /// Append a newly queued entry at the back of a loaded list.
    pub fn add(&self, entry: WaitlistEntry) -> bool {
        let member = self
            .members
            .member_by_id(Some(Self::member_season()), entry.member_id);
        self.inner.mutate(&Self::key(entry.facility_type_id), |queue| {
            let position = queue.len() + 1;
            queue.push(enrich(entry, member.as_ref(), position));
        })
    }

    /// Drop `member_id` from a loaded list and close the gap in positions.
    pub fn remove(&self, facility_type_id: i64, member_id: i64) -> bool {
        self.inner.mutate(&Self::key(facility_type_id), |queue| {
            queue.retain(|e| e.entry.member_id != member_id);
            for (index, entry) in queue.iter_mut().enumerate() {
                entry.position = index + 1;
            }
        })
    }

    pub fn entries(&self, facility_type_id: i64) -> Option<Vec<WaitlistMemberDetail>> {
        self.inner.data(&Self::key(facility_type_id))
    }

    pub fn is_loading(&self, facility_type_id: i64) -> bool {
        self.inner.is_loading(&Self::key(facility_type_id))
    }

    pub fn error(&self, facility_type_id: i64) -> Option<String> {
        self.inner.error_message(&Self::key(facility_type_id))
    }

    pub fn cache_age(&self, facility_type_id: i64) -> Option<Duration> {
        self.inner.cache_age(&Self::key(facility_type_id))
    }

    pub fn count(&self, facility_type_id: i64) -> usize {
        self.entries(facility_type_id).map(|e| e.len()).unwrap_or(0)
    }

    pub fn position_of(&self, facility_type_id: i64, member_id: i64) -> Option<usize> {
        self.entries(facility_type_id)?
            .into_iter()
            .find(|e| e.entry.member_id == member_id)
            .map(|e| e.position)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::repository::DEFAULT_COALESCE_TIMEOUT;
    use crate::testing::{member, waitlist_entry, FakeApi};

    fn setup() -> (Arc<FakeApi>, Arc<MembersRepository>, WaitlistRepository) {
        let api = Arc::new(FakeApi::default());
        let mut jo = member(5, "Jo", "Lee");
        jo.email = Some("jo@example.com".to_string());
        api.set_members(vec![jo, member(6, "Mia", "Horvat")]);
        api.set_waitlist(3, vec![waitlist_entry(1, 5, 3), waitlist_entry(2, 99, 3)]);

        let members = Arc::new(MembersRepository::new(api.clone(), DEFAULT_COALESCE_TIMEOUT));
        let repo = WaitlistRepository::new(api.clone(), Arc::clone(&members), DEFAULT_COALESCE_TIMEOUT);
        (api, members, repo)
    }

    #[test]
    fn test_join_resolves_names_and_positions() {
        let members = vec![member(5, "Jo", "Lee")];
        let entries = vec![waitlist_entry(1, 5, 3), waitlist_entry(2, 99, 3)];

        let joined = join_members(&entries, &members);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].position, 1);
        assert_eq!(joined[0].member_name, "Jo Lee");
        assert_eq!(joined[1].position, 2);
        assert_eq!(joined[1].member_name, UNKNOWN_MEMBER);
        assert_eq!(joined[1].member_email, "");
    }

    #[tokio::test]
    async fn test_load_fetches_members_first() {
        let (api, members, repo) = setup();

        let joined = repo.load(3, false).await.unwrap();

        assert_eq!(api.calls("fetch_members"), 1);
        assert_eq!(api.calls("fetch_waitlist"), 1);
        assert_eq!(joined[0].member_email, "jo@example.com");
        assert_eq!(joined[1].member_name, UNKNOWN_MEMBER);
        assert_eq!(members.count(members.current_season()), 2);
    }

    #[tokio::test]
    async fn test_cached_members_are_reused() {
        let (api, _members, repo) = setup();

        repo.load(3, false).await.unwrap();
        repo.load(3, true).await.unwrap();

        assert_eq!(api.calls("fetch_members"), 1);
        assert_eq!(api.calls("fetch_waitlist"), 2);
    }

    #[tokio::test]
    async fn test_member_failure_fails_the_load() {
        let (api, _members, repo) = setup();
        api.fail_with(ApiError::Unauthorized);

        let err = repo.load(3, false).await.unwrap_err();

        assert_eq!(err, LoadError::Api(ApiError::Unauthorized));
        assert!(repo.error(3).is_some());
        assert_eq!(api.calls("fetch_waitlist"), 0);
    }

    #[tokio::test]
    async fn test_missing_waitlist_is_empty() {
        let (_api, _members, repo) = setup();

        assert!(repo.load(8, false).await.unwrap().is_empty());
        assert!(repo.error(8).is_none());
    }

    #[tokio::test]
    async fn test_add_and_remove_renumber_positions() {
        let (_api, _members, repo) = setup();
        repo.load(3, false).await.unwrap();

        assert!(repo.add(waitlist_entry(3, 6, 3)));
        assert_eq!(repo.position_of(3, 6), Some(3));
        assert_eq!(
            repo.entries(3).unwrap()[2].member_name,
            "Mia Horvat"
        );

        assert!(repo.remove(3, 5));
        assert_eq!(repo.count(3), 2);
        assert_eq!(repo.position_of(3, 99), Some(1));
        assert_eq!(repo.position_of(3, 6), Some(2));
    }

    #[tokio::test]
    async fn test_add_to_unloaded_list_is_noop() {
        let (_api, _members, repo) = setup();

        assert!(!repo.add(waitlist_entry(3, 6, 4)));
        assert!(repo.entries(4).is_none());
    }
}
