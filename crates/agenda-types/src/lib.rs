//! Shared type definitions for the Agenda scheduling engine.
//!
//! This crate is the single source of truth for the types exchanged
//! between the engine, the store and the HTTP layer. Types flow
//! downstream to `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for event and registration identifiers
//! - [`enums`] -- Event and registration status enumerations
//! - [`structs`] -- The indexed [`Event`], attendee [`Registration`]s and
//!   their request forms
//! - [`reports`] -- Conflict reports and engine statistics

pub mod enums;
pub mod ids;
pub mod reports;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EventStatus, RegistrationStatus, UnknownStatus};
pub use ids::{EventId, RegistrationId};
pub use reports::{ConflictPair, ScheduleOutcome, SchedulerStats, StructureInfo};
pub use structs::{
    Event, NewEvent, NewRegistration, Registration, RegistrationSummary, RegistrationUpdate,
};
