//! In-memory index structures behind the Agenda scheduling engine.
//!
//! Each structure is self-contained, synchronous and generic over its
//! payload. The engine in `agenda-core` keeps one of each in lockstep over
//! the same set of events.
//!
//! # Modules
//!
//! - [`ordered`] -- Unbalanced binary search tree for sorted snapshots and
//!   inclusive range queries by start time.
//! - [`interval`] -- AVL interval tree augmented with subtree max-end for
//!   overlap search and all-pairs conflict enumeration.
//! - [`upcoming`] -- Binary min-heap of future items, rebuilt wholesale
//!   rather than edited in place.
//! - [`identity`] -- Separate-chaining hash map with a 32-bit polynomial
//!   rolling hash.
//! - [`trie`] -- Lowercased prefix tree with frequency-ranked autocomplete.
//! - [`dependency`] -- Directed precedence graph, acyclic by admission
//!   control, with Kahn topological ordering.
//! - [`error`] -- Structural rejections from the dependency graph.

use std::sync::Arc;

use agenda_types::{Event, EventId};

pub mod dependency;
pub mod error;
pub mod identity;
pub mod interval;
pub mod ordered;
pub mod trie;
pub mod upcoming;

pub use dependency::{DependencyGraph, GraphInfo};
pub use error::GraphError;
pub use identity::{IdentityIndex, RollingKey, rolling_hash};
pub use interval::{IntervalIndex, overlaps};
pub use ordered::OrderedIndex;
pub use trie::{DEFAULT_SEARCH_LIMIT, NameTrie};
pub use upcoming::{Scheduled, UpcomingQueue};

/// Payloads that carry a stable identity, used to delete by id rather than
/// by structural key.
pub trait Identified {
    /// The identity type.
    type Id: PartialEq;

    /// This payload's identity.
    fn identity(&self) -> &Self::Id;
}

impl Identified for Event {
    type Id = EventId;

    fn identity(&self) -> &EventId {
        &self.id
    }
}

impl<T: Identified> Identified for Arc<T> {
    type Id = T::Id;

    fn identity(&self) -> &T::Id {
        T::identity(self)
    }
}
