use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates the PostgreSQL connection pool and ensures the schema exists.
///
/// The pool is opened once at process start and handed to every store;
/// `PgPool::close` is awaited on shutdown.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");

    ensure_schema(&pool).await?;
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id                  UUID PRIMARY KEY,
        title               TEXT NOT NULL,
        company_name        TEXT NOT NULL,
        location            TEXT NOT NULL,
        industry            TEXT NOT NULL,
        position            TEXT,
        salary_range        TEXT,
        required_experience TEXT,
        required_degree     TEXT,
        image_url           TEXT,
        skills_required     TEXT[] NOT NULL DEFAULT '{}',
        job_description     TEXT NOT NULL DEFAULT '',
        posted_at           TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cvs (
        id             UUID PRIMARY KEY,
        user_id        UUID NOT NULL,
        source_format  TEXT NOT NULL,
        extracted_text TEXT NOT NULL DEFAULT '',
        file_key       TEXT,
        embedding      REAL[] NOT NULL DEFAULT '{}',
        uploaded_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS cvs_user_uploaded_idx ON cvs (user_id, uploaded_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS interactions (
        id               UUID PRIMARY KEY,
        user_id          UUID NOT NULL,
        job_id           UUID NOT NULL REFERENCES jobs (id) ON DELETE CASCADE,
        interaction_type TEXT NOT NULL
            CHECK (interaction_type IN ('viewed', 'saved', 'applied')),
        notes            TEXT,
        interaction_time TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS interactions_user_job_type_idx
        ON interactions (user_id, job_id, interaction_type)
    "#,
];

async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema verified");
    Ok(())
}
