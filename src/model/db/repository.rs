//! The persistence contract for entities.
//!
//! Implementations are straight mappings onto storage operations; they apply
//! no business rules.

use thiserror::Error;

use crate::model::common::election::ElectionStatus;
use crate::model::db::election::Election;

/// Failures reported by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the given ID.
    #[error("no matching row")]
    NotFound,
    /// The database rejected the operation or could not be reached.
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A type that is persisted as a row.
pub trait Entity {
    /// The caller-writable fields of the entity.
    type Spec: Send + Sync;
}

/// Basic persistence operations for an entity type.
#[rocket::async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Entity + Send,
{
    /// Insert a new row, returning the ID the store assigned to it.
    async fn save(&self, spec: &T::Spec) -> StoreResult<String>;

    /// Fetch the row with the given ID.
    async fn get_by_id(&self, id: &str) -> StoreResult<T>;

    /// Overwrite every writable field of the row with the given ID.
    async fn update_one(&self, id: &str, spec: &T::Spec) -> StoreResult<()>;
}

/// Election persistence, with filtered listing on top of the basics.
#[rocket::async_trait]
pub trait ElectionRepository: Repository<Election> {
    /// Newest-first page of elections, optionally restricted to one status.
    async fn get_all_filtered(
        &self,
        status: Option<ElectionStatus>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Election>>;
}
