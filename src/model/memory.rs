//! An in-process election store.
//!
//! Behaves like the PostgreSQL store (server-assigned IDs and timestamps,
//! newest-first listing) without needing a database. Handles are cheap to
//! clone and share the same rows, so a test can keep one handle while the
//! server owns another.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::model::{
    common::election::ElectionStatus,
    db::{
        election::{Election, ElectionSpec},
        repository::{ElectionRepository, Repository, StoreError, StoreResult},
    },
};

#[derive(Debug, Default)]
struct Shared {
    /// Rows in insertion order.
    rows: Mutex<Vec<Election>>,
    /// Number of operations that reached the store.
    calls: AtomicUsize,
    /// Number of successful inserts and updates.
    writes: AtomicUsize,
    /// When set, every operation fails as if the database were unreachable.
    unavailable: AtomicBool,
    /// When set, inserts and updates fail while reads still succeed.
    read_only: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryElectionRepository(Arc<Shared>);

impl MemoryElectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.0.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make inserts and updates fail (or succeed again) without affecting
    /// reads.
    pub fn set_read_only(&self, read_only: bool) {
        self.0.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Insert a row directly, bypassing any business rules. Returns the stored
    /// election.
    pub fn insert(&self, spec: ElectionSpec) -> Election {
        let now = self.next_timestamp();
        let election = Election {
            id: uuid::Uuid::new_v4().to_string(),
            election: spec,
            created_at: now,
            updated_at: now,
        };
        self.rows().push(election.clone());
        election
    }

    /// All rows, oldest first.
    pub fn all(&self) -> Vec<Election> {
        self.rows().clone()
    }

    /// Number of operations that have reached the store.
    pub fn calls(&self) -> usize {
        self.0.calls.load(Ordering::SeqCst)
    }

    /// Number of rows inserted or overwritten through the repository API.
    pub fn writes(&self) -> usize {
        self.0.writes.load(Ordering::SeqCst)
    }

    fn rows(&self) -> MutexGuard<'_, Vec<Election>> {
        // A panicking test may poison the lock; the rows are still usable.
        self.0.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and fail if the store has been made unavailable.
    fn enter(&self) -> StoreResult<()> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        if self.0.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Like `enter`, for operations that write.
    fn enter_write(&self) -> StoreResult<()> {
        self.enter()?;
        if self.0.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// The current time, nudged forward if needed so that creation times are
    /// strictly increasing.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.rows().iter().map(|e| e.created_at).max() {
            Some(latest) if latest >= now => latest + chrono::Duration::microseconds(1),
            _ => now,
        }
    }
}

#[rocket::async_trait]
impl Repository<Election> for MemoryElectionRepository {
    async fn save(&self, spec: &ElectionSpec) -> StoreResult<String> {
        self.enter_write()?;
        let election = self.insert(spec.clone());
        self.0.writes.fetch_add(1, Ordering::SeqCst);
        Ok(election.id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Election> {
        self.enter()?;
        self.rows()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_one(&self, id: &str, spec: &ElectionSpec) -> StoreResult<()> {
        self.enter_write()?;
        let mut rows = self.rows();
        let election = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound)?;
        election.election = spec.clone();
        election.updated_at = Utc::now();
        self.0.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[rocket::async_trait]
impl ElectionRepository for MemoryElectionRepository {
    async fn get_all_filtered(
        &self,
        status: Option<ElectionStatus>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Election>> {
        self.enter()?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(0);
        let mut matching = self
            .rows()
            .iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching.into_iter().skip(skip).take(take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn lists_newest_first_with_filter_and_paging() {
        let repo = MemoryElectionRepository::new();
        let first = repo.insert(ElectionSpec::future_example());
        let second = repo.insert(ElectionSpec::current_example());
        let third = repo.insert(ElectionSpec::future_example());

        let all = repo.get_all_filtered(None, 10, 0).await.unwrap();
        let ids = all.iter().map(|e| e.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);

        let drafts = repo
            .get_all_filtered(Some(ElectionStatus::Draft), 10, 0)
            .await
            .unwrap();
        assert_eq!(drafts, vec![third.clone(), first.clone()]);

        let page = repo.get_all_filtered(None, 1, 1).await.unwrap();
        assert_eq!(page, vec![second]);
        assert!(repo.get_all_filtered(None, 10, 3).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn update_missing_row_is_not_found() {
        let repo = MemoryElectionRepository::new();
        let result = repo
            .update_one("missing", &ElectionSpec::future_example())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
        assert_eq!(repo.writes(), 0);
    }

    #[rocket::async_test]
    async fn unavailable_store_fails_everything() {
        let repo = MemoryElectionRepository::new();
        let existing = repo.insert(ElectionSpec::future_example());
        repo.set_unavailable(true);

        assert!(matches!(
            repo.get_by_id(&existing.id).await,
            Err(StoreError::Db(_))
        ));
        assert!(matches!(
            repo.save(&ElectionSpec::future_example()).await,
            Err(StoreError::Db(_))
        ));
        assert_eq!(repo.calls(), 2);
        assert_eq!(repo.all().len(), 1);
    }

    #[rocket::async_test]
    async fn read_only_store_fails_writes() {
        let repo = MemoryElectionRepository::new();
        let existing = repo.insert(ElectionSpec::future_example());
        repo.set_read_only(true);

        assert_eq!(repo.get_by_id(&existing.id).await.unwrap(), existing);
        assert!(matches!(
            repo.update_one(&existing.id, &ElectionSpec::current_example())
                .await,
            Err(StoreError::Db(_))
        ));
        assert!(matches!(
            repo.save(&ElectionSpec::future_example()).await,
            Err(StoreError::Db(_))
        ));
        assert_eq!(repo.writes(), 0);
        assert_eq!(repo.all(), vec![existing]);
    }
}
