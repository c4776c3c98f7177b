pub mod accounts; // Login gate, registration, doctor provisioning
pub mod api; // Web surface: router, middleware, pages
pub mod authorization;
pub mod config;
pub mod core_state; // Shared state: database path + sessions
pub mod crypto;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod scheduling; // Booking with conflict detection, completion
pub mod seed;
pub mod session_cache;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("State error: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}

/// Initialize tracing from `RUST_LOG`, falling back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Serve the web application until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    let core = Arc::new(core_state::CoreState::new(
        config.database_path.clone(),
        config.session_idle_timeout,
    )?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut server = api::start_server(core, config.bind_addr)
            .await
            .map_err(StartupError::Server)?;
        tracing::info!(addr = %server.info.addr, "Listening");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
        server.shutdown();
        server.stopped().await;
        Ok(())
    })
}
