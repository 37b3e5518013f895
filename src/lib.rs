pub mod adherence;
pub mod api;
pub mod clock;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod medicines;
pub mod models;
pub mod schedule;
pub mod store;
pub mod validation;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Start the REST backend with configuration from the environment and
/// serve until Ctrl-C.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let server_config = config::ServerConfig::from_env();

    // Fail fast on an unusable database before accepting connections
    db::open_database(&server_config.db_path)
        .map_err(|e| format!("Cannot open {}: {e}", server_config.db_path.display()))?;
    tracing::info!(path = %server_config.db_path.display(), "Database ready");

    let core = Arc::new(core_state::CoreState::new(&server_config));
    let mut server = api::start_api_server_on(core, server_config.bind_addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }

    server.shutdown();
    server.stopped().await;
    Ok(())
}
