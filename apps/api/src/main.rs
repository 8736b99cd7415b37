mod config;
mod db;
mod embedding;
mod errors;
mod ingestion;
mod interactions;
mod jobs;
mod models;
mod recommendation;
mod routes;
mod state;
mod storage;
mod store;
mod vector_index;

#[cfg(test)]
mod testing;

use anyhow::{bail, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::HttpEmbeddingClient;
use crate::jobs::reindex::reindex_jobs;
use crate::routes::build_router;
use crate::state::{AppState, Backends};
use crate::storage::S3Archive;
use crate::store::{PgCvStore, PgInteractionStore, PgJobStore};
use crate::vector_index::PineconeIndex;

#[derive(Parser)]
#[command(name = "jobmatch", version)]
#[command(about = "CV-to-job recommendation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Re-embed every job and upsert it into the job namespace
    ReindexJobs {
        #[arg(long, default_value_t = 100)]
        batch_size: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::ReindexJobs { batch_size } => reindex(config, batch_size).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting jobmatch API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let embedder = HttpEmbeddingClient::new(&config.embedding_service_url, config.http_timeout())?;
    let index = PineconeIndex::new(
        &config.vector_index_url,
        config.vector_index_api_key.clone(),
        config.http_timeout(),
    )?;
    info!("Embedding and vector index clients initialized");

    let state = AppState::new(
        config.clone(),
        Backends {
            jobs: Arc::new(PgJobStore::new(db.clone())),
            cvs: Arc::new(PgCvStore::new(db.clone())),
            interactions: Arc::new(PgInteractionStore::new(db.clone())),
            embedder: Arc::new(embedder),
            index: Arc::new(index),
            archive: Arc::new(S3Archive::new(s3, config.s3_bucket.clone())),
        },
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn reindex(config: Config, batch_size: u32) -> Result<()> {
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    let jobs = PgJobStore::new(db.clone());
    let embedder = HttpEmbeddingClient::new(&config.embedding_service_url, config.http_timeout())?;
    let index = PineconeIndex::new(
        &config.vector_index_url,
        config.vector_index_api_key.clone(),
        config.http_timeout(),
    )?;

    info!("Re-indexing jobs in batches of {batch_size}");
    let report = reindex_jobs(&jobs, &embedder, &index, batch_size).await;
    db.close().await;

    let report = report?;
    info!("Re-index finished: {} indexed, {} failed", report.indexed, report.failed);
    if report.failed > 0 {
        bail!("{} of {} jobs failed to index", report.failed, report.indexed + report.failed);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "jobmatch-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
