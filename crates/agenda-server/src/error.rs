//! Error types for the Agenda binary.

/// Top-level startup and runtime error.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: agenda_core::ConfigError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: agenda_db::DbError,
    },

    /// Seeding the engine from the store failed.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: agenda_core::SchedulerError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: agenda_api::ServerError,
    },
}
