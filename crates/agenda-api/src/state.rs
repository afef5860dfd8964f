//! Shared application state for the HTTP layer.
//!
//! [`AppState`] owns the one [`Scheduler`] instance for the process behind
//! an async read-write lock. Each engine call is made under the lock and
//! never awaits, so it is atomic with respect to other requests. Store
//! round-trips happen outside the lock; two requests touching the same
//! event can interleave there and the last one to reach the engine wins.

use std::sync::Arc;

use agenda_core::Scheduler;
use agenda_db::{EventStore, RegistrationStore};
use tokio::sync::RwLock;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The scheduling engine.
    pub scheduler: Arc<RwLock<Scheduler>>,
    /// System of record. `None` runs the API in memory-only mode, where
    /// ids and creation times are assigned here.
    pub store: Option<EventStore>,
    /// Attendee registrations. Only available with a database.
    pub registrations: Option<RegistrationStore>,
}

impl AppState {
    /// Memory-only state around an (already initialized) scheduler.
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            store: None,
            registrations: None,
        }
    }

    /// State backed by the `PostgreSQL` stores.
    pub fn with_store(
        scheduler: Scheduler,
        store: EventStore,
        registrations: RegistrationStore,
    ) -> Self {
        Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            store: Some(store),
            registrations: Some(registrations),
        }
    }
}
