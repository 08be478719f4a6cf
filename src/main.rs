use anyhow::{Context, Result};
use metamatrix::{
    config, db,
    routes::routes::{AppState, routes},
    services::{
        metadata_service::MetadataService, metadata_store::SqliteMetadataStore,
        nlu_client::NluClient,
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting metamatrix with config: {:?}", cfg);

    // --- Initialize SQLite connection ---
    tracing::debug!("Connecting using raw URL => {}", cfg.database_url);
    let pool = Arc::new(db::connect(&cfg.database_url).await?);

    // --- Schema ---
    db::run_migrations(&pool).await?;
    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize core service ---
    let store = Arc::new(SqliteMetadataStore::new(pool.clone()));
    let analyzer = Arc::new(
        NluClient::new(&cfg.nlu_api_url, &cfg.nlu_api_key, cfg.nlu_timeout)
            .context("building NLU client")?,
    );
    let metadata = MetadataService::new(store, analyzer);

    // --- Build router ---
    let app = routes(AppState { metadata, db: pool });

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
