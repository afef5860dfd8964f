//! Connection pool for the events database.
//!
//! Pool size and acquire timeout come straight from the `database`
//! section of [`AgendaConfig`](agenda_core::AgendaConfig). Every session
//! identifies itself as `agenda` in `pg_stat_activity`.

use std::str::FromStr;
use std::time::Duration;

use agenda_core::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::DbError;

/// `application_name` reported by every pooled session.
const APPLICATION_NAME: &str = "agenda";

/// Shared handle to the events database.
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open a pool sized and timed by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] for an unparsable URL, or
    /// [`DbError::Postgres`] if no connection can be established.
    pub async fn connect(settings: &DatabaseConfig) -> Result<Self, DbError> {
        let options = connect_options(&settings.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .connect_with(options)
            .await?;

        tracing::info!(
            max_connections = settings.max_connections,
            acquire_timeout_secs = settings.connect_timeout_secs,
            "Events database connected"
        );
        Ok(Self { pool })
    }

    /// Open a pool for `url` with the default sizing.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn connect_url(url: &str) -> Result<Self, DbError> {
        let settings = DatabaseConfig {
            url: url.to_owned(),
            ..DatabaseConfig::default()
        };
        Self::connect(&settings).await
    }

    /// Bring the schema up to date with the embedded `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if a migration fails to apply.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        let migrator = sqlx::migrate!("./migrations");
        migrator.run(&self.pool).await?;
        tracing::info!(known = migrator.iter().count(), "Events schema up to date");
        Ok(())
    }

    /// The underlying [`PgPool`], for building stores.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections to return, then close them all.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Events database closed");
    }
}

/// Parse `url` and tag the session with [`APPLICATION_NAME`].
fn connect_options(url: &str) -> Result<PgConnectOptions, DbError> {
    PgConnectOptions::from_str(url)
        .map(|options| options.application_name(APPLICATION_NAME))
        .map_err(|e| DbError::Config(format!("invalid database URL: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn url_parts_are_kept_and_session_is_tagged() {
        let options = connect_options("postgresql://a:b@db:6543/agenda").unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("agenda"));
        assert_eq!(options.get_application_name(), Some(APPLICATION_NAME));
    }

    #[test]
    fn malformed_url_is_a_config_error() {
        assert!(matches!(
            connect_options("not a url"),
            Err(DbError::Config(_))
        ));
    }
}
