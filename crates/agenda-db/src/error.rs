//! Failures of the events database.
//!
//! [`DbError`] wraps the underlying [`sqlx`] errors and reports stored rows
//! that cannot be turned back into domain records.

/// Everything that can go wrong talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A query or connection failed.
    #[error("events database error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// The embedded schema could not be applied.
    #[error("events schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row violates a domain constraint.
    #[error("invalid row {id}: {reason}")]
    InvalidRow {
        /// Primary key of the offending row.
        id: uuid::Uuid,
        /// What could not be converted.
        reason: String,
    },

    /// The database settings are unusable (e.g. a malformed URL).
    #[error("database settings: {0}")]
    Config(String),
}
