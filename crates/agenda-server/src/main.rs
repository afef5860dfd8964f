//! Agenda server binary.
//!
//! Wires the scheduling engine to its system of record and the HTTP API.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `AGENDA_CONFIG` (default `agenda.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `PostgreSQL` and apply migrations if enabled
//! 4. Build the scheduler and seed it from the `events` table
//! 5. Serve HTTP until `Ctrl-C`
//! 6. Close the pool

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use agenda_api::{AppState, start_server};
use agenda_core::{AgendaConfig, LoggingConfig, Scheduler};
use agenda_db::{EventStore, PostgresPool, RegistrationStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "AGENDA_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "agenda.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server stops
/// abnormally.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Load configuration.
    let path = std::env::var_os(CONFIG_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = AgendaConfig::load_or_default(&path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config = %path.display(),
        host = config.server.host,
        port = config.server.port,
        "agenda-server starting"
    );

    // 3. Connect to PostgreSQL.
    let pool = PostgresPool::connect(&config.database).await?;
    if config.database.run_migrations {
        pool.run_migrations().await?;
    }
    let store = EventStore::new(pool.pool().clone());
    let registrations = RegistrationStore::new(pool.pool().clone());

    // 4. Build and seed the engine.
    let mut scheduler = Scheduler::with_config(config.scheduler);
    let loaded = scheduler.initialize_from(&store).await?;
    info!(events = loaded, "Scheduler seeded from store");

    // 5. Serve.
    let state = Arc::new(AppState::with_store(scheduler, store, registrations));
    let served = start_server(&config.server, state).await;

    // 6. Close the pool even if serving failed.
    pool.close().await;
    served?;

    info!("agenda-server stopped");
    Ok(())
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
