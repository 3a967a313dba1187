//! Business rules for elections.
//!
//! The manager sits between the HTTP handlers and the store. It validates
//! input, enforces the draft-only editing rule against freshly read state, and
//! classifies store failures. It holds no election data of its own.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{
    common::election::{ElectionId, ElectionStatus},
    db::{
        election::{Election, ElectionSpec},
        repository::{ElectionRepository, StoreError},
    },
    pagination::Pagination,
};

/// Failures of election operations.
///
/// Store failures are kept as the error source for logging; they are never
/// part of the message shown to clients.
#[derive(Debug, Error)]
pub enum ElectionError {
    /// A business rule was violated by the request.
    #[error("{0}")]
    Validation(String),
    #[error("election {0} does not exist")]
    NotFound(ElectionId),
    /// The election is outside its draft-and-not-started window.
    #[error("election {0} can no longer be modified")]
    Immutable(ElectionId),
    #[error("could not create election")]
    CreateFailed(#[source] StoreError),
    #[error("could not list elections")]
    ListFailed(#[source] StoreError),
    #[error("could not get election {0}")]
    LookupFailed(ElectionId, #[source] StoreError),
    #[error("could not update election {0}")]
    UpdateFailed(ElectionId, #[source] StoreError),
}

pub type Result<T> = std::result::Result<T, ElectionError>;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct ElectionManager {
    repo: Box<dyn ElectionRepository>,
    clock: Clock,
}

impl ElectionManager {
    pub fn new(repo: impl ElectionRepository + 'static) -> Self {
        Self::with_clock(repo, Utc::now)
    }

    /// Use `clock` instead of the system time to decide whether an election
    /// has started.
    pub fn with_clock(
        repo: impl ElectionRepository + 'static,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        Self {
            repo: Box::new(repo),
            clock: Box::new(clock),
        }
    }

    /// Store a new election. It is always stored as a draft.
    pub async fn create(&self, req: &RequestId, mut spec: ElectionSpec) -> Result<()> {
        spec.status = ElectionStatus::Draft;
        if !spec.has_valid_timespan() {
            warn!("req{req} rejected election: start time is not before end time");
            return Err(ElectionError::Validation(
                "start time must be before end time".to_string(),
            ));
        }
        let id = self.repo.save(&spec).await.map_err(|e| {
            error!("req{req} could not save election: {e}");
            ElectionError::CreateFailed(e)
        })?;
        info!("req{req} created election {id}");
        Ok(())
    }

    /// A newest-first page of elections, optionally restricted to a status.
    ///
    /// `status` is checked before the store is consulted; `None` lists every
    /// status.
    pub async fn list(
        &self,
        req: &RequestId,
        status: Option<&str>,
        page_num: i64,
        page_size: i64,
    ) -> Result<Vec<Election>> {
        let status = self.parse_status(req, status)?;
        let pagination = Pagination::new(page_num, page_size).map_err(|e| {
            warn!("req{req} rejected listing: {e}");
            ElectionError::Validation(e.to_string())
        })?;
        let elections = self
            .repo
            .get_all_filtered(status, pagination.limit(), pagination.offset())
            .await
            .map_err(|e| {
                error!("req{req} could not list elections: {e}");
                ElectionError::ListFailed(e)
            })?;
        info!(
            "req{req} listed {} elections (status {}, page {})",
            elections.len(),
            status.map_or("any", ElectionStatus::as_str),
            pagination.page_num(),
        );
        Ok(elections)
    }

    /// Check a raw status filter. `None` stays unfiltered.
    pub fn parse_status(
        &self,
        req: &RequestId,
        status: Option<&str>,
    ) -> Result<Option<ElectionStatus>> {
        status
            .map(str::parse::<ElectionStatus>)
            .transpose()
            .map_err(|e| {
                warn!("req{req} rejected listing: {e}");
                ElectionError::Validation("status is invalid".to_string())
            })
    }

    /// Fetch a single election.
    pub async fn get_one(&self, req: &RequestId, id: &str) -> Result<Election> {
        let election = self.fetch(req, id).await?;
        info!("req{req} found election {id}");
        Ok(election)
    }

    /// Fetch an election, failing unless it may currently be modified.
    ///
    /// This is the only place the editing rule is checked.
    pub async fn ensure_mutable(&self, req: &RequestId, id: &str) -> Result<Election> {
        let election = self.fetch(req, id).await?;
        if !election.is_mutable((self.clock)()) {
            warn!(
                "req{req} election {id} is {} starting {}, refusing to modify",
                election.status, election.start_time
            );
            return Err(ElectionError::Immutable(id.to_string()));
        }
        Ok(election)
    }

    /// Replace every writable field of a draft election.
    ///
    /// The current state is re-read first. There is no version check between
    /// that read and the write, so concurrent updates of the same election are
    /// last-writer-wins.
    pub async fn update(&self, req: &RequestId, id: &str, spec: ElectionSpec) -> Result<()> {
        self.ensure_mutable(req, id).await?;
        if !spec.has_valid_timespan() {
            warn!("req{req} rejected update of {id}: start time is not before end time");
            return Err(ElectionError::Validation(
                "start time must be before end time".to_string(),
            ));
        }
        self.repo.update_one(id, &spec).await.map_err(|e| match e {
            StoreError::NotFound => {
                warn!("req{req} election {id} disappeared before it could be updated");
                ElectionError::NotFound(id.to_string())
            }
            e => {
                error!("req{req} could not update election {id}: {e}");
                ElectionError::UpdateFailed(id.to_string(), e)
            }
        })?;
        info!("req{req} updated election {id}");
        Ok(())
    }

    async fn fetch(&self, req: &RequestId, id: &str) -> Result<Election> {
        self.repo.get_by_id(id).await.map_err(|e| match e {
            StoreError::NotFound => {
                warn!("req{req} election {id} does not exist");
                ElectionError::NotFound(id.to_string())
            }
            e => {
                error!("req{req} could not get election {id}: {e}");
                ElectionError::LookupFailed(id.to_string(), e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::model::memory::MemoryElectionRepository;

    use super::*;

    fn req() -> RequestId {
        RequestId::from("test-request-id")
    }

    /// A manager whose clock is frozen at `now`.
    fn manager_at(now: DateTime<Utc>) -> (ElectionManager, MemoryElectionRepository) {
        let repo = MemoryElectionRepository::new();
        (ElectionManager::with_clock(repo.clone(), move || now), repo)
    }

    fn spec_starting(start_time: DateTime<Utc>, status: ElectionStatus) -> ElectionSpec {
        ElectionSpec {
            start_time,
            end_time: start_time + Duration::hours(1),
            ..ElectionSpec::future_example().with_status(status)
        }
    }

    #[rocket::async_test]
    async fn create_forces_draft() {
        let (manager, repo) = manager_at(Utc::now());
        for status in ElectionStatus::ALL {
            let spec = ElectionSpec::future_example().with_status(status);
            manager.create(&req(), spec).await.unwrap();
        }
        let stored = repo.all();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|e| e.status == ElectionStatus::Draft));
        assert_eq!(stored[0].title, ElectionSpec::future_example().title);
    }

    #[rocket::async_test]
    async fn create_rejects_bad_timespan() {
        let (manager, repo) = manager_at(Utc::now());
        let now = Utc::now();
        let cases = [(now, now - Duration::hours(1)), (now, now)];
        for (start_time, end_time) in cases {
            let spec = ElectionSpec {
                start_time,
                end_time,
                ..ElectionSpec::future_example()
            };
            let err = manager.create(&req(), spec).await.unwrap_err();
            assert!(
                matches!(err, ElectionError::Validation(ref m) if m == "start time must be before end time")
            );
        }
        assert_eq!(repo.calls(), 0);
    }

    #[rocket::async_test]
    async fn create_wraps_store_failure() {
        let (manager, repo) = manager_at(Utc::now());
        repo.set_unavailable(true);
        let err = manager
            .create(&req(), ElectionSpec::future_example())
            .await
            .unwrap_err();
        assert!(matches!(err, ElectionError::CreateFailed(StoreError::Db(_))));
    }

    #[rocket::async_test]
    async fn get_one_returns_stored_fields() {
        let (manager, repo) = manager_at(Utc::now());
        let stored = repo.insert(ElectionSpec::current_example());
        let fetched = manager.get_one(&req(), &stored.id).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[rocket::async_test]
    async fn get_one_separates_absence_from_failure() {
        let (manager, repo) = manager_at(Utc::now());
        let err = manager.get_one(&req(), "unknown-id").await.unwrap_err();
        assert!(matches!(err, ElectionError::NotFound(ref id) if id == "unknown-id"));

        repo.set_unavailable(true);
        let err = manager.get_one(&req(), "unknown-id").await.unwrap_err();
        assert!(matches!(err, ElectionError::LookupFailed(_, StoreError::Db(_))));
    }

    #[rocket::async_test]
    async fn list_rejects_unknown_status_before_store() {
        let (manager, repo) = manager_at(Utc::now());
        let err = manager
            .list(&req(), Some("bogus"), 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ElectionError::Validation(ref m) if m == "status is invalid"));
        assert_eq!(repo.calls(), 0);
    }

    #[rocket::async_test]
    async fn list_rejects_bad_pages_before_store() {
        let (manager, repo) = manager_at(Utc::now());
        for (page, size) in [(0, 10), (-1, 10), (1, 0), (1, -10), (i64::MAX, 10)] {
            let err = manager.list(&req(), None, page, size).await.unwrap_err();
            assert!(matches!(err, ElectionError::Validation(_)), "{page}/{size}");
        }
        assert_eq!(repo.calls(), 0);
    }

    #[rocket::async_test]
    async fn list_filters_and_orders() {
        let (manager, repo) = manager_at(Utc::now());
        let draft1 = repo.insert(ElectionSpec::future_example());
        repo.insert(ElectionSpec::current_example());
        let draft2 = repo.insert(ElectionSpec::future_example());
        repo.insert(ElectionSpec::past_example());

        let drafts = manager.list(&req(), Some("draft"), 1, 10).await.unwrap();
        assert_eq!(drafts, vec![draft2, draft1]);

        let all = manager.list(&req(), None, 1, 10).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }

    #[rocket::async_test]
    async fn list_pages() {
        let (manager, repo) = manager_at(Utc::now());
        let mut ids = (0..25)
            .map(|_| repo.insert(ElectionSpec::future_example()).id)
            .collect::<Vec<_>>();
        ids.reverse();

        let first = manager.list(&req(), None, 1, 10).await.unwrap();
        let second = manager.list(&req(), None, 2, 10).await.unwrap();
        let third = manager.list(&req(), None, 3, 10).await.unwrap();
        let ids_of = |page: &[Election]| page.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids_of(&first), ids[0..10].to_vec());
        assert_eq!(ids_of(&second), ids[10..20].to_vec());
        assert_eq!(ids_of(&third), ids[20..25].to_vec());
    }

    #[rocket::async_test]
    async fn list_wraps_store_failure() {
        let (manager, repo) = manager_at(Utc::now());
        repo.set_unavailable(true);
        let err = manager.list(&req(), None, 1, 10).await.unwrap_err();
        assert!(matches!(err, ElectionError::ListFailed(_)));
    }

    #[rocket::async_test]
    async fn update_overwrites_draft() {
        let now = Utc::now();
        let (manager, repo) = manager_at(now);
        let existing = repo.insert(spec_starting(now + Duration::hours(2), ElectionStatus::Draft));

        let replacement = ElectionSpec {
            title: "Updated".to_string(),
            description: "Updated description".to_string(),
            ..spec_starting(now + Duration::hours(3), ElectionStatus::Active)
        };
        manager
            .update(&req(), &existing.id, replacement.clone())
            .await
            .unwrap();

        let stored = manager.get_one(&req(), &existing.id).await.unwrap();
        assert_eq!(stored.election, replacement);
        assert_eq!(stored.created_at, existing.created_at);
        assert_eq!(repo.writes(), 1);
    }

    #[rocket::async_test]
    async fn update_refuses_outside_mutable_window() {
        let now = Utc::now();
        let (manager, repo) = manager_at(now);
        let future = now + Duration::hours(1);
        let cases = [
            spec_starting(future, ElectionStatus::Active),
            spec_starting(future, ElectionStatus::Closed),
            spec_starting(future, ElectionStatus::Archived),
            spec_starting(now - Duration::hours(1), ElectionStatus::Draft),
            spec_starting(now, ElectionStatus::Draft),
        ];
        for spec in cases {
            let existing = repo.insert(spec.clone());
            let err = manager
                .update(&req(), &existing.id, ElectionSpec::future_example())
                .await
                .unwrap_err();
            assert!(
                matches!(err, ElectionError::Immutable(ref id) if *id == existing.id),
                "{spec:?}"
            );
            assert_eq!(manager.get_one(&req(), &existing.id).await.unwrap(), existing);
        }
        assert_eq!(repo.writes(), 0);
    }

    #[rocket::async_test]
    async fn update_missing_election() {
        let (manager, repo) = manager_at(Utc::now());
        let err = manager
            .update(&req(), "unknown-id", ElectionSpec::future_example())
            .await
            .unwrap_err();
        assert!(matches!(err, ElectionError::NotFound(_)));
        assert_eq!(repo.writes(), 0);
    }

    #[rocket::async_test]
    async fn update_rejects_bad_timespan() {
        let now = Utc::now();
        let (manager, repo) = manager_at(now);
        let existing = repo.insert(spec_starting(now + Duration::hours(2), ElectionStatus::Draft));
        let backwards = ElectionSpec {
            end_time: now,
            ..spec_starting(now + Duration::hours(2), ElectionStatus::Draft)
        };
        let err = manager
            .update(&req(), &existing.id, backwards)
            .await
            .unwrap_err();
        assert!(matches!(err, ElectionError::Validation(_)));
        assert_eq!(repo.writes(), 0);
    }

    #[rocket::async_test]
    async fn update_wraps_lookup_failure() {
        let now = Utc::now();
        let (manager, repo) = manager_at(now);
        let existing = repo.insert(spec_starting(now + Duration::hours(2), ElectionStatus::Draft));
        repo.set_unavailable(true);
        let err = manager
            .update(&req(), &existing.id, ElectionSpec::future_example())
            .await
            .unwrap_err();
        assert!(matches!(err, ElectionError::LookupFailed(..)));
    }

    #[rocket::async_test]
    async fn update_wraps_write_failure() {
        let now = Utc::now();
        let (manager, repo) = manager_at(now);
        let existing = repo.insert(spec_starting(now + Duration::hours(2), ElectionStatus::Draft));
        repo.set_read_only(true);
        let err = manager
            .update(&req(), &existing.id, ElectionSpec::future_example())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ElectionError::UpdateFailed(ref id, StoreError::Db(_)) if *id == existing.id)
        );
        assert_eq!(repo.all(), vec![existing]);
    }

    #[rocket::async_test]
    async fn mutable_window_is_judged_by_the_clock() {
        let start = Utc::now() + Duration::days(1);
        let repo = MemoryElectionRepository::new();
        let existing = repo.insert(spec_starting(start, ElectionStatus::Draft));

        let before = ElectionManager::with_clock(repo.clone(), move || start - Duration::seconds(1));
        assert!(before.ensure_mutable(&req(), &existing.id).await.is_ok());

        let at = ElectionManager::with_clock(repo.clone(), move || start);
        assert!(matches!(
            at.ensure_mutable(&req(), &existing.id).await,
            Err(ElectionError::Immutable(_))
        ));
    }
}
