use sqlx::{Executor, PgPool};

/// Table definitions, applied in order. Only `elections` is read or written
/// by the server; `users` and `votes` complete the persisted layout.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS elections (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title VARCHAR(255) NOT NULL,
        description TEXT,
        start_time TIMESTAMP WITH TIME ZONE NOT NULL,
        end_time TIMESTAMP WITH TIME ZONE NOT NULL,
        status VARCHAR(20) DEFAULT 'draft' CHECK (status IN ('draft', 'active', 'closed', 'archived')),
        created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        first_name VARCHAR(20) NOT NULL,
        last_name VARCHAR(20) NOT NULL,
        middle_name VARCHAR(20),
        email VARCHAR(50) UNIQUE NOT NULL,
        role VARCHAR(20) DEFAULT 'base' CHECK (role IN ('base', 'admin')),
        active BOOLEAN DEFAULT true,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS votes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        election_id UUID REFERENCES elections(id),
        user_id UUID REFERENCES users(id),
        created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE INDEX IF NOT EXISTS elections_status_created_at_idx ON elections (status, created_at DESC)",
];

/// Create any missing tables and indexes.
pub async fn ensure_schema_exists(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        pool.execute(*statement).await?;
    }
    Ok(())
}
