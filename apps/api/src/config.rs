use anyhow::{Context, Result};

use crate::recommendation::engine::MAX_TOP_K;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub embedding_service_url: String,
    pub vector_index_url: String,
    pub vector_index_api_key: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub http_timeout_secs: u64,
    pub default_top_k: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_top_k: usize = parse_env("DEFAULT_TOP_K", 10)?;
        check_default_top_k(default_top_k)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            embedding_service_url: require_env("EMBEDDING_SERVICE_URL")?,
            vector_index_url: require_env("VECTOR_INDEX_URL")?,
            vector_index_api_key: require_env("VECTOR_INDEX_API_KEY")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 30)?,
            default_top_k,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

fn check_default_top_k(value: usize) -> Result<()> {
    if value == 0 || value > MAX_TOP_K {
        anyhow::bail!("DEFAULT_TOP_K must be between 1 and {MAX_TOP_K}, got {value}");
    }
    Ok(())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
