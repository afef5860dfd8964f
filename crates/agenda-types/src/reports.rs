//! Results returned by the scheduling engine to the HTTP layer.
//!
//! Events are shared as [`Arc`] handles: every index holds the same
//! allocation, so a report never deep-copies event payloads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::Event;

/// Outcome of indexing a new (or re-indexed) event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScheduleOutcome {
    /// The event as indexed.
    pub event: Arc<Event>,
    /// Already-indexed events whose interval overlaps the new one.
    pub conflicts: Vec<Arc<Event>>,
    /// `true` when `conflicts` is non-empty.
    pub has_conflicts: bool,
}

impl ScheduleOutcome {
    /// Build an outcome, deriving `has_conflicts` from the conflict list.
    pub fn new(event: Arc<Event>, conflicts: Vec<Arc<Event>>) -> Self {
        let has_conflicts = !conflicts.is_empty();
        Self {
            event,
            conflicts,
            has_conflicts,
        }
    }
}

/// An unordered pair of overlapping events.
///
/// `first` never starts after `second`; each pair is reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConflictPair {
    /// The earlier-starting event of the pair.
    pub first: Arc<Event>,
    /// The later-starting event of the pair.
    pub second: Arc<Event>,
}

/// Static description of one of the engine's index structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StructureInfo {
    /// Short name of the index inside the engine.
    pub name: String,
    /// The data structure backing it.
    pub kind: String,
    /// What the engine uses it for.
    pub purpose: String,
    /// Cost of its main operation.
    pub complexity: String,
}

/// Aggregated engine statistics for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SchedulerStats {
    /// Events in the identity index.
    pub total_events: usize,
    /// Number of overlapping pairs across all events.
    pub conflicts_count: usize,
    /// The first overlapping pairs, capped by configuration.
    pub conflicts: Vec<ConflictPair>,
    /// Earliest future event captured at the last queue rebuild.
    pub next_upcoming: Option<Arc<Event>>,
    /// Number of events in the upcoming queue.
    pub upcoming_count: usize,
    /// Height of the start-time search tree.
    pub timeline_height: usize,
    /// Height of the balanced interval tree.
    pub interval_height: usize,
    /// Nodes in the dependency graph.
    pub graph_nodes: usize,
    /// Edges in the dependency graph.
    pub graph_edges: usize,
    /// Whether the dependency graph contains a cycle (never expected).
    pub graph_has_cycle: bool,
    /// Description of every index structure.
    pub structures: Vec<StructureInfo>,
}
