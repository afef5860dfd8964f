//! `PostgreSQL` system of record for Agenda.
//!
//! The database owns the events; the scheduling engine is a derived cache
//! rebuilt from it at startup through [`EventStore`]'s
//! [`EventSource`](agenda_core::EventSource) implementation.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and migrations
//! - [`event_store`] -- CRUD on the `events` table and row conversion
//! - [`registration_store`] -- CRUD and check-in on the `registrations` table
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod postgres;
pub mod registration_store;

pub use error::DbError;
pub use event_store::{EventRow, EventStore};
pub use postgres::PostgresPool;
pub use registration_store::{RegistrationRow, RegistrationStore};
