//! Scheduling engine for Agenda.
//!
//! This crate ties the index structures from `agenda-index` together into
//! one explicitly owned engine and supplies its surroundings.
//!
//! # Modules
//!
//! - [`scheduler`] -- [`Scheduler`], the facade that fans every event
//!   mutation out to all six indexes and answers composite queries.
//! - [`clock`] -- [`Clock`] abstraction over "now", with a wall clock and a
//!   manually driven clock.
//! - [`source`] -- [`EventSource`], the system of record the engine is
//!   seeded from at startup.
//! - [`config`] -- YAML configuration with environment overrides.
//! - [`error`] -- [`SchedulerError`].

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    AgendaConfig, ConfigError, DatabaseConfig, LoggingConfig, SchedulerConfig, ServerConfig,
};
pub use error::SchedulerError;
pub use scheduler::Scheduler;
pub use source::EventSource;
