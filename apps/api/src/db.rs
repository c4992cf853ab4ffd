use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                      UUID PRIMARY KEY,
    username                TEXT NOT NULL UNIQUE,
    email                   TEXT NOT NULL UNIQUE,
    hashed_password         TEXT NOT NULL,
    first_name              TEXT,
    last_name               TEXT,
    profile_image_url       TEXT,
    profession              TEXT,
    bio                     TEXT,
    reset_token             TEXT UNIQUE,
    reset_token_expiration  TIMESTAMPTZ,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the account table when missing. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(USERS_SCHEMA).execute(pool).await?;
    info!("Account schema ready");
    Ok(())
}
