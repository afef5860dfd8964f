//! HTTP API for the Agenda scheduling engine.
//!
//! An Axum server exposing event CRUD, conflict detection, name search,
//! upcoming queries, dependency ordering and attendee registrations as
//! JSON endpoints. The [`Scheduler`](agenda_core::Scheduler) is the read
//! model; an optional [`EventStore`](agenda_db::EventStore) is the system
//! of record and is written before the engine on every mutation.
//!
//! # Modules
//!
//! - [`handlers`] -- one function per event endpoint
//! - [`registrations`] -- registration endpoints, database-backed only
//! - [`router`] -- route table and middleware
//! - [`server`] -- bind, serve and graceful shutdown
//! - [`state`] -- [`AppState`] shared across handlers
//! - [`error`] -- [`ApiError`] and its JSON rendering

pub mod error;
pub mod handlers;
pub mod registrations;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
