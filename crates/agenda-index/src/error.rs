//! Error types for the `agenda-index` crate.
//!
//! Absence is never an error here: lookups return `Option` or empty
//! collections. Only structural rejections from the dependency graph are
//! reported through [`GraphError`].

/// Rejections raised by [`DependencyGraph`](crate::DependencyGraph).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The requested edge would close a cycle (including a self-loop).
    #[error("adding this dependency would create a circular dependency")]
    WouldCreateCycle,

    /// A topological order could not cover every node.
    #[error("graph has a cycle: ordered {ordered} of {nodes} nodes")]
    CycleDetected {
        /// Nodes emitted before the frontier ran dry.
        ordered: usize,
        /// Total nodes in the graph.
        nodes: usize,
    },
}
