//! Foreground server: logging setup, startup and signal-driven shutdown.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hostlink_config::{Config, ConfigError, ConfigLoader, ConfigValidator, LoggingConfig};
use hostlink_dispatch::{ActionRouter, TickDriver};
use hostlink_ws::WsServer;

use crate::register::{build_registry, SCENE_NAME};
use crate::scene::SceneStore;

/// Load configuration and fail on the first validation error.
///
/// Warnings are returned so the caller can report them once logging is up.
pub(crate) fn load_config(path: Option<&Path>) -> Result<(Config, Vec<String>), ConfigError> {
    let config = ConfigLoader::load_or_default(path)?;
    let warnings = ConfigValidator::validate(&config)?
        .into_result()?
        .into_iter()
        .map(|w| format!("{}: {}", w.path, w.message))
        .collect();
    Ok((config, warnings))
}

/// Initialize tracing with console output and, when `logging.directory` is
/// set, a daily-rotated log file.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.directory {
        Some(directory) => {
            let log_dir = PathBuf::from(ConfigLoader::expand_path(directory));
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("hostlink")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // Dropping the guard stops the background writer.
            static GUARD: OnceLock<WorkerGuard> = OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Run the server in foreground until Ctrl-C.
pub(crate) async fn run_server(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, warnings) = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    // Overrides bypass the file, so check them again.
    ConfigValidator::validate(&config)?.into_result()?;

    init_tracing(&config.logging)?;
    for warning in &warnings {
        warn!("Config warning: {}", warning);
    }

    let scene = Arc::new(SceneStore::new(SCENE_NAME));
    let router = ActionRouter::new(build_registry(Arc::clone(&scene))?);
    info!(actions = router.registry().len(), "Actions registered");

    let server = WsServer::new(&config, router);
    let addr = server.start(config.server.port).await?;
    let mut driver = TickDriver::spawn(server.dispatch_queue(), config.dispatch.tick_interval())?;

    info!("hostlink ready:");
    info!("  WebSocket:     ws://{}", addr);
    info!("  Dispatch tick: {:?}", config.dispatch.tick_interval());

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    server.stop().await;
    // Stopping the driver drains whatever the closed connections left behind.
    driver.stop();

    let totals = server.router().metrics().snapshot();
    info!(
        processed = totals.processed,
        succeeded = totals.succeeded,
        failed = totals.failed,
        rejected = totals.rejected,
        undelivered = totals.undelivered,
        scene_objects = scene.len(),
        "Dispatch totals"
    );
    Ok(())
}
