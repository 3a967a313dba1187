mod repository;
mod schema;

pub use repository::PgElectionRepository;
pub use schema::ensure_schema_exists;
