//! Error types for the `agenda-core` crate.

use agenda_index::GraphError;
use agenda_types::EventId;

/// Errors returned by [`Scheduler`](crate::Scheduler) operations.
///
/// Lookups of absent events are not errors; they return `None` or an empty
/// collection. These variants cover rejected mutations and seeding failures.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The id is not present in the identity index.
    #[error("event not found: {0}")]
    UnknownEvent(EventId),

    /// The dependency graph refused an edge or could not be ordered.
    #[error("dependency {from} -> {to} rejected: {source}")]
    Dependency {
        /// Prerequisite event.
        from: EventId,
        /// Dependent event.
        to: EventId,
        /// The graph's reason.
        source: GraphError,
    },

    /// No execution order exists because the graph contains a cycle.
    #[error("no execution order: {0}")]
    Ordering(#[from] GraphError),

    /// The event source failed while seeding the engine.
    #[error("failed to load events from source: {0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),
}
