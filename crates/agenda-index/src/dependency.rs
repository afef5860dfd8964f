//! Directed precedence graph kept acyclic by admission control.
//!
//! An edge `from -> to` means `from` must happen before `to`. Before an
//! edge is linked, a depth-first reachability search from `to` checks
//! whether `from` is already reachable; if so the edge is refused and the
//! graph is left untouched. Cycles therefore never form through
//! [`DependencyGraph::add_edge`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::GraphError;

/// Summary counters for a [`DependencyGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphInfo {
    /// Number of nodes.
    pub nodes: usize,
    /// Number of directed edges.
    pub edges: usize,
    /// Whether any cycle exists.
    pub has_cycle: bool,
}

/// Adjacency-list digraph over node ids `N`.
#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    /// node -> nodes that depend on it, in insertion order.
    adjacency: BTreeMap<N, Vec<N>>,
}

impl<N: Ord + Clone> DependencyGraph<N> {
    /// Create an empty graph.
    pub const fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
        }
    }

    /// Add an isolated node. Returns `false` if it was already present.
    pub fn add_node(&mut self, id: N) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, Vec::new());
        true
    }

    /// Link `from -> to`, creating either node if missing.
    ///
    /// Re-adding an existing edge is a no-op. Self-loops and edges that
    /// would make `from` reachable from `to` are refused with
    /// [`GraphError::WouldCreateCycle`].
    pub fn add_edge(&mut self, from: N, to: N) -> Result<(), GraphError> {
        if self.reaches(&to, &from) {
            return Err(GraphError::WouldCreateCycle);
        }
        self.add_node(to.clone());
        let targets = self.adjacency.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
        Ok(())
    }

    /// Unlink `from -> to`. Returns `false` if the edge did not exist.
    pub fn remove_edge(&mut self, from: &N, to: &N) -> bool {
        let Some(targets) = self.adjacency.get_mut(from) else {
            return false;
        };
        let Some(pos) = targets.iter().position(|t| t == to) else {
            return false;
        };
        targets.remove(pos);
        true
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &N) -> bool {
        let existed = self.adjacency.remove(id).is_some();
        for targets in self.adjacency.values_mut() {
            targets.retain(|t| t != id);
        }
        existed
    }

    /// Whether `id` is a node.
    pub fn contains(&self, id: &N) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Whether the graph contains any cycle.
    ///
    /// Depth-first search with an explicit stack of `(node, remaining
    /// children)` frames; a cycle is an edge back into the current path.
    pub fn has_cycle(&self) -> bool {
        let mut finished: BTreeSet<&N> = BTreeSet::new();
        let mut on_path: BTreeSet<&N> = BTreeSet::new();
        for root in self.adjacency.keys() {
            if finished.contains(root) {
                continue;
            }
            on_path.insert(root);
            let mut stack = vec![(root, self.children(root))];
            while let Some((node, children)) = stack.last_mut() {
                match children.next() {
                    Some(next) if on_path.contains(next) => return true,
                    Some(next) => {
                        if !finished.contains(next) {
                            on_path.insert(next);
                            stack.push((next, self.children(next)));
                        }
                    }
                    None => {
                        let done = *node;
                        stack.pop();
                        on_path.remove(done);
                        finished.insert(done);
                    }
                }
            }
        }
        false
    }

    /// Kahn's algorithm: a node appears only after all its prerequisites.
    ///
    /// Nodes with equal standing come out in key order.
    pub fn topological_sort(&self) -> Result<Vec<N>, GraphError> {
        let mut in_degree: BTreeMap<&N, usize> = self.adjacency.keys().map(|n| (n, 0)).collect();
        for to in self.adjacency.values().flatten() {
            let degree = in_degree.entry(to).or_insert(0);
            *degree = degree.saturating_add(1);
        }

        let mut frontier: VecDeque<&N> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&node, _)| node)
            .collect();

        let mut order = Vec::with_capacity(self.adjacency.len());
        while let Some(current) = frontier.pop_front() {
            order.push(current.clone());
            for next in self.adjacency.get(current).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        frontier.push_back(next);
                    }
                }
            }
        }

        if order.len() == self.adjacency.len() {
            Ok(order)
        } else {
            Err(GraphError::CycleDetected {
                ordered: order.len(),
                nodes: self.adjacency.len(),
            })
        }
    }

    /// Every node reachable from `id` along edges (direct and transitive),
    /// in breadth-first order. `id` itself is not included.
    pub fn get_dependents(&self, id: &N) -> Vec<N> {
        bfs(id, |node| self.adjacency.get(node).into_iter().flatten())
    }

    /// Every node from which `id` is reachable (direct and transitive),
    /// nearest first. `id` itself is not included.
    pub fn get_prerequisites(&self, id: &N) -> Vec<N> {
        let mut reverse: BTreeMap<&N, Vec<&N>> = BTreeMap::new();
        for (from, targets) in &self.adjacency {
            for to in targets {
                reverse.entry(to).or_default().push(from);
            }
        }
        bfs(id, |node| reverse.get(node).into_iter().flatten().copied())
    }

    /// Every edge as `(from, to)`.
    pub fn edges(&self) -> Vec<(N, N)> {
        self.adjacency
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(|to| (from.clone(), to.clone())))
            .collect()
    }

    /// Node and edge counts plus cycle status.
    pub fn info(&self) -> GraphInfo {
        GraphInfo {
            nodes: self.node_count(),
            edges: self.edge_count(),
            has_cycle: self.has_cycle(),
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.adjacency.clear();
    }

    /// Depth-first search from `start` looking for `target`.
    fn reaches(&self, start: &N, target: &N) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.adjacency.get(current).into_iter().flatten());
        }
        false
    }

    fn children(&self, node: &N) -> std::slice::Iter<'_, N> {
        self.adjacency.get(node).map_or(&[][..], Vec::as_slice).iter()
    }
}

impl<N: Ord + Clone> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Breadth-first walk from `start`, returning every node discovered.
fn bfs<'a, N, F, I>(start: &'a N, neighbors: F) -> Vec<N>
where
    N: Ord + Clone + 'a,
    F: Fn(&'a N) -> I,
    I: Iterator<Item = &'a N>,
{
    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut found = Vec::new();
    while let Some(current) = queue.pop_front() {
        for next in neighbors(current) {
            if visited.insert(next) {
                found.push(next.clone());
                queue.push_back(next);
            }
        }
    }
    found
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn reverse_edge_is_refused_and_order_survives() {
        let mut graph = DependencyGraph::new();
        assert!(graph.add_edge("A", "B").is_ok());
        assert_eq!(graph.add_edge("B", "A"), Err(GraphError::WouldCreateCycle));
        assert_eq!(graph.topological_sort().unwrap(), vec!["A", "B"]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loop_is_refused() {
        let mut graph = DependencyGraph::new();
        graph.add_node(1);
        assert_eq!(graph.add_edge(1, 1), Err(GraphError::WouldCreateCycle));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn transitive_cycle_is_refused_without_mutation() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(2, 3).unwrap();
        assert!(graph.add_edge(3, 1).is_err());
        assert!(!graph.has_cycle());
        assert_eq!(graph.edges(), vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = DependencyGraph::new();
        graph.add_edge('a', 'b').unwrap();
        graph.add_edge('a', 'b').unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.remove_edge(&'a', &'b'));
        assert!(!graph.remove_edge(&'a', &'b'));
    }

    #[test]
    fn topological_sort_respects_every_edge() {
        let mut graph = DependencyGraph::new();
        for (from, to) in [(5, 11), (7, 11), (7, 8), (3, 8), (3, 10), (11, 2), (11, 9), (8, 9)] {
            graph.add_edge(from, to).unwrap();
        }
        let order = graph.topological_sort().unwrap();
        assert_eq!(order.len(), graph.node_count());
        let position = |n: i32| order.iter().position(|&x| x == n).unwrap();
        for (from, to) in graph.edges() {
            assert!(position(from) < position(to), "{from} before {to}");
        }
    }

    #[test]
    fn cycle_injected_behind_admission_is_reported() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(1, 2).unwrap();
        // Bypass admission control.
        graph.adjacency.entry(2).or_default().push(1);
        assert!(graph.has_cycle());
        assert_eq!(
            graph.topological_sort(),
            Err(GraphError::CycleDetected { ordered: 0, nodes: 2 })
        );
    }

    #[test]
    fn long_chain_is_walked_without_recursion() {
        let mut graph = DependencyGraph::new();
        for i in 0..100_000_u32 {
            graph.add_edge(i, i + 1).unwrap();
        }
        assert_eq!(
            graph.info(),
            GraphInfo {
                nodes: 100_001,
                edges: 100_000,
                has_cycle: false
            }
        );
        assert_eq!(graph.topological_sort().unwrap().len(), 100_001);

        // Close the chain behind admission control.
        graph.adjacency.entry(100_000).or_default().push(0);
        assert!(graph.has_cycle());
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
            graph.add_edge(from, to).unwrap();
        }
        assert!(!graph.has_cycle());
    }

    #[test]
    fn dependents_and_prerequisites_are_transitive() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("setup", "talk").unwrap();
        graph.add_edge("talk", "qa").unwrap();
        graph.add_edge("talk", "dinner").unwrap();
        graph.add_node("unrelated");

        assert_eq!(graph.get_dependents(&"setup"), vec!["talk", "qa", "dinner"]);
        assert_eq!(graph.get_prerequisites(&"qa"), vec!["talk", "setup"]);
        assert!(graph.get_dependents(&"unrelated").is_empty());
        assert!(graph.get_prerequisites(&"missing").is_empty());
    }

    #[test]
    fn remove_node_strips_incoming_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(3, 2).unwrap();
        assert!(graph.remove_node(&2));
        assert!(!graph.contains(&2));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(
            graph.info(),
            GraphInfo {
                nodes: 2,
                edges: 0,
                has_cycle: false
            }
        );
    }
}
