//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and the audit trail in dependency order
//! - Bind the listener and serve until a shutdown signal
//! - Drain the audit trail on the way out
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::audit::{AuditTrail, JsonLinesWriter, LogWriter};
use crate::config::{load_config, ConfigError, ConfigWatcher, GateConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::{logging, metrics};

#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// TOML config file. Defaults are used when absent.
    pub config_path: Option<PathBuf>,
    /// Reload the config file when it changes.
    pub watch: bool,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Start everything and serve until SIGINT/SIGTERM.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "card-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        operation_ms = config.timeouts.operation_ms,
        min_gzip_bytes = config.compression.min_gzip_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut trail = match &config.audit.file {
        Some(path) => AuditTrail::new(
            config.audit.queue_capacity,
            JsonLinesWriter::open(Path::new(path)).await?,
        ),
        None => AuditTrail::new(config.audit.queue_capacity, LogWriter),
    };
    trail.start();

    let (config_updates, _watcher) = match (&options.config_path, options.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        _ => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config, trail.sink());
    let served = server.run(listener, config_updates, server_shutdown).await;

    trail.stop().await;
    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
