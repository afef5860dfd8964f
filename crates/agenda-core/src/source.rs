//! The collaborator that seeds the engine at startup.

use std::convert::Infallible;
use std::future::Future;

use agenda_types::Event;

/// A system of record the engine can be rebuilt from.
///
/// The engine is a derived cache: on startup it asks the source for every
/// event and indexes them. Sources are expected to be cheap to borrow and
/// safe to share across tasks.
pub trait EventSource {
    /// Failure type of the underlying store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every event currently in the store.
    fn load_all(&self) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send;
}

/// An in-memory source, used for fixtures and memory-only deployments.
impl EventSource for Vec<Event> {
    type Error = Infallible;

    async fn load_all(&self) -> Result<Vec<Event>, Infallible> {
        Ok(self.clone())
    }
}
