use sqlx::{postgres::PgRow, query, query_as, query_scalar, FromRow, PgPool, Row};
use uuid::Uuid;

use crate::model::{
    common::election::ElectionStatus,
    db::{
        election::{Election, ElectionSpec},
        repository::{ElectionRepository, Repository, StoreError, StoreResult},
    },
};

/// Elections stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgElectionRepository {
    pool: PgPool,
}

impl PgElectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// IDs that are not UUIDs cannot match any row.
fn parse_id(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| StoreError::NotFound)
}

#[rocket::async_trait]
impl Repository<Election> for PgElectionRepository {
    async fn save(&self, spec: &ElectionSpec) -> StoreResult<String> {
        let id = query_scalar::<_, String>(
            "INSERT INTO elections (title, description, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id::text",
        )
        .bind(&spec.title)
        .bind(&spec.description)
        .bind(spec.start_time)
        .bind(spec.end_time)
        .bind(spec.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Election> {
        let id = parse_id(id)?;
        query_as::<_, Election>(
            "SELECT id::text AS id, title, description, start_time, end_time, status, created_at, updated_at
            FROM elections
            WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_one(&self, id: &str, spec: &ElectionSpec) -> StoreResult<()> {
        let id = parse_id(id)?;
        let result = query(
            "UPDATE elections
            SET title = $1, description = $2, start_time = $3, end_time = $4, status = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $6",
        )
        .bind(&spec.title)
        .bind(&spec.description)
        .bind(spec.start_time)
        .bind(spec.end_time)
        .bind(spec.status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl ElectionRepository for PgElectionRepository {
    async fn get_all_filtered(
        &self,
        status: Option<ElectionStatus>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Election>> {
        let elections = query_as::<_, Election>(
            "SELECT id::text AS id, title, description, start_time, end_time, status, created_at, updated_at
            FROM elections
            WHERE $1::text IS NULL OR status = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3",
        )
        .bind(status.map(ElectionStatus::as_str))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(elections)
    }
}

impl<'r> FromRow<'r, PgRow> for Election {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<ElectionStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            id: row.try_get("id")?,
            election: ElectionSpec {
                title: row.try_get("title")?,
                description: row
                    .try_get::<Option<String>, _>("description")?
                    .unwrap_or_default(),
                start_time: row.try_get("start_time")?,
                end_time: row.try_get("end_time")?,
                status,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
