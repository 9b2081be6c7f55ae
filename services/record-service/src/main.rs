//! Record service binary entry point.

use anyhow::Context;
use record_service::{
    config, logging, server, Cache, PgRecordStore, RecordServiceConfig, RecordServiceImpl,
    RecordStore, RedisCache,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = config::load_env_file(Path::new(".env"));

    logging::init_console();

    if let Err(e) = env_file {
        tracing::warn!(error = %e, "Ignoring unreadable .env file");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    tracing::info!("Starting record-service");

    let config = RecordServiceConfig::load().context("Failed to load configuration")?;

    let (request_log, _log_guard) =
        logging::open_request_log(&config.log).context("Failed to open log file")?;
    tracing::info!(path = %config.log.path().display(), "Request log opened");

    let redis_url = config.redis.url();
    let cache = RedisCache::connect(&redis_url)
        .await
        .context("Failed to connect to Redis")?;
    cache.ping().await.context("Failed to connect to Redis")?;
    tracing::info!(url = %redis_url, "Connected to Redis");

    let store = PgRecordStore::connect(&config.postgres)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store.ping().await.context("Failed to connect to PostgreSQL")?;
    tracing::info!(host = %config.postgres.host, database = %config.postgres.database, "Connected to PostgreSQL");

    store
        .migrate()
        .await
        .context("Failed to migrate PostgreSQL schema")?;
    tracing::info!("Schema up to date");

    let service = RecordServiceImpl::new(Arc::new(cache), Arc::new(store), request_log);

    let addr = config.service.socket_addr()?;
    server::serve(addr, service, server::shutdown_signal())
        .await
        .with_context(|| format!("Failed to serve on {addr}"))?;

    Ok(())
}
