//! The scheduling engine: six indexes kept in lockstep over one event set.
//!
//! [`Scheduler`] owns one instance of each structure from `agenda-index`
//! and maps every mutation onto the matching sequence of operations across
//! all of them:
//!
//! | Structure | Key | Answers |
//! |-----------|-----|---------|
//! | [`OrderedIndex`] | `(start_ms, id)` | sorted listing, range by start |
//! | [`IntervalIndex`] | `(start_ms, end_ms)` | overlaps, all-pairs conflicts |
//! | [`UpcomingQueue`] | `start_ms` | next / upcoming (future only) |
//! | [`IdentityIndex`] | id, and `YYYY-MM-DD` | lookup by id, events on a day |
//! | [`NameTrie`] | lowercased name | prefix search |
//! | [`DependencyGraph`] | id | precedence, execution order |
//!
//! Outside of a call, the identity index, timeline, interval index and
//! graph hold exactly the same ids. The name trie holds one event per
//! distinct lowercased name: the last one indexed, or after that one is
//! removed, the most recently created namesake. The upcoming queue is a
//! snapshot of events that were in the future when it was last rebuilt.
//!
//! Updates never edit an indexed copy in place: the old form is removed
//! and the new one indexed, because start and end are structural keys.
//! Removal always uses the keys of the *indexed* copy, so a stale snapshot
//! from the caller cannot leave orphaned entries behind. Across requests
//! the last caller still wins; there is no compare-and-swap.

use std::sync::Arc;

use agenda_index::{
    DependencyGraph, IdentityIndex, IntervalIndex, NameTrie, OrderedIndex, Scheduled,
    UpcomingQueue,
};
use agenda_types::{
    ConflictPair, Event, EventId, ScheduleOutcome, SchedulerStats, StructureInfo,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::source::EventSource;

/// Multi-index scheduling engine over a mutable set of events.
#[derive(Debug)]
pub struct Scheduler<C = SystemClock> {
    config: SchedulerConfig,
    clock: C,
    initialized: bool,
    timeline: OrderedIndex<(i64, EventId), Arc<Event>>,
    intervals: IntervalIndex<Arc<Event>>,
    upcoming: UpcomingQueue<Arc<Event>>,
    by_id: IdentityIndex<EventId, Arc<Event>>,
    by_day: IdentityIndex<String, Vec<Arc<Event>>>,
    names: NameTrie<Arc<Event>>,
    dependencies: DependencyGraph<EventId>,
}

impl Scheduler<SystemClock> {
    /// Create an empty scheduler on the wall clock with default tuning.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create an empty scheduler on the wall clock.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for Scheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Scheduler<C> {
    /// Create an empty scheduler reading "now" from `clock`.
    pub fn with_clock(config: SchedulerConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            initialized: false,
            timeline: OrderedIndex::new(),
            intervals: IntervalIndex::new(),
            upcoming: UpcomingQueue::new(),
            by_id: IdentityIndex::new(),
            by_day: IdentityIndex::new(),
            names: NameTrie::new(),
            dependencies: DependencyGraph::new(),
        }
    }

    /// The tuning this scheduler was built with.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Clear every structure, then index `events`.
    ///
    /// Returns the number of events indexed. A repeated id replaces the
    /// earlier record.
    pub fn initialize(&mut self, events: impl IntoIterator<Item = Event>) -> usize {
        self.clear();
        for event in events {
            self.index_event(Arc::new(event));
        }
        self.initialized = true;
        info!(
            events = self.by_id.len(),
            timeline = self.timeline.len(),
            intervals = self.intervals.len(),
            upcoming = self.upcoming.len(),
            "Scheduler initialized"
        );
        self.by_id.len()
    }

    /// Load every event from `source` and [`initialize`](Self::initialize).
    pub async fn initialize_from<S>(&mut self, source: &S) -> Result<usize, SchedulerError>
    where
        S: EventSource + Sync,
    {
        let events = source
            .load_all()
            .await
            .map_err(|err| SchedulerError::Source(Box::new(err)))?;
        Ok(self.initialize(events))
    }

    /// Drop every indexed event and mark the scheduler uninitialized.
    pub fn clear(&mut self) {
        self.timeline.clear();
        self.intervals.clear();
        self.upcoming.clear();
        self.by_id.clear();
        self.by_day.clear();
        self.names.clear();
        self.dependencies.clear();
        self.initialized = false;
        debug!("Scheduler cleared");
    }

    /// Whether [`initialize`](Self::initialize) has run since the last clear.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of indexed events.
    pub const fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no events are indexed.
    pub const fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Index `event` and report which already-indexed events it overlaps.
    ///
    /// Conflicts never include the event itself, and come back ordered by
    /// start. If the id is already indexed the old record is replaced.
    pub fn add_event(&mut self, event: Event) -> ScheduleOutcome {
        let mut conflicts: Vec<Arc<Event>> = self
            .intervals
            .find_overlapping(event.start_ms(), event.end_ms())
            .into_iter()
            .filter(|other| other.id != event.id)
            .cloned()
            .collect();
        conflicts.sort_by_key(|e| (e.start_ms(), e.id));

        let event = Arc::new(event);
        self.index_event(Arc::clone(&event));
        debug!(id = %event.id, conflicts = conflicts.len(), "Event added");
        ScheduleOutcome::new(event, conflicts)
    }

    /// Replace `old` with `new`: remove then re-add, returning the conflict
    /// report for `new`.
    ///
    /// When the id is unchanged, dependency edges touching it survive the
    /// re-index.
    pub fn update_event(&mut self, old: &Event, new: Event) -> ScheduleOutcome {
        let preserved: Vec<(EventId, EventId)> = if old.id == new.id {
            self.dependencies
                .edges()
                .into_iter()
                .filter(|(from, to)| *from == old.id || *to == old.id)
                .collect()
        } else {
            Vec::new()
        };

        self.unindex(&old.id);
        let outcome = self.add_event(new);

        for (from, to) in preserved {
            if let Err(err) = self.dependencies.add_edge(from, to) {
                warn!(%from, %to, error = %err, "Dependency dropped during update");
            }
        }
        outcome
    }

    /// Remove `event` from every structure. Returns the indexed copy, or
    /// `None` if its id was not indexed.
    pub fn delete_event(&mut self, event: &Event) -> Option<Arc<Event>> {
        let removed = self.unindex(&event.id);
        debug!(id = %event.id, found = removed.is_some(), "Event deleted");
        removed
    }

    /// Rebuild the upcoming queue from the identity index, admitting only
    /// events that start strictly after the clock's current instant.
    pub fn rebuild_upcoming(&mut self) {
        let now = self.clock.now_ms();
        self.upcoming.rebuild(
            self.by_id
                .values()
                .filter(|event| event.start_ms() > now)
                .map(|event| Scheduled::new(event.start_ms(), Arc::clone(event))),
        );
        debug!(now, upcoming = self.upcoming.len(), "Upcoming queue rebuilt");
    }

    // -----------------------------------------------------------------------
    // Dependencies
    // -----------------------------------------------------------------------

    /// Record that `from` must happen before `to`.
    ///
    /// Both events must be indexed. An edge that would close a cycle is
    /// refused and the graph is left unchanged.
    pub fn add_dependency(&mut self, from: EventId, to: EventId) -> Result<(), SchedulerError> {
        for id in [from, to] {
            if !self.by_id.has(&id) {
                return Err(SchedulerError::UnknownEvent(id));
            }
        }
        self.dependencies.add_edge(from, to).map_err(|source| {
            warn!(%from, %to, "Dependency rejected: would create a cycle");
            SchedulerError::Dependency { from, to, source }
        })?;
        debug!(%from, %to, "Dependency added");
        Ok(())
    }

    /// Remove the edge `from -> to`. Returns `false` if it did not exist.
    pub fn remove_dependency(&mut self, from: &EventId, to: &EventId) -> bool {
        self.dependencies.remove_edge(from, to)
    }

    /// All events in an order that respects every dependency.
    pub fn get_execution_order(&self) -> Result<Vec<Arc<Event>>, SchedulerError> {
        let order = self.dependencies.topological_sort()?;
        Ok(self.resolve(&order))
    }

    /// Events that transitively depend on `id`, nearest first.
    pub fn get_dependents(&self, id: &EventId) -> Vec<Arc<Event>> {
        self.resolve(&self.dependencies.get_dependents(id))
    }

    /// Events `id` transitively depends on, nearest first.
    pub fn get_prerequisites(&self, id: &EventId) -> Vec<Arc<Event>> {
        self.resolve(&self.dependencies.get_prerequisites(id))
    }

    /// Dependency edges as `(from, to)` pairs.
    pub fn dependencies(&self) -> Vec<(EventId, EventId)> {
        self.dependencies.edges()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Event with the given id.
    pub fn get_event_by_id(&self, id: &EventId) -> Option<Arc<Event>> {
        self.by_id.get(id).cloned()
    }

    /// Events starting on `day` (`YYYY-MM-DD`, UTC), in indexing order.
    pub fn get_events_by_date(&self, day: &str) -> Vec<Arc<Event>> {
        self.by_day.get(&day.to_owned()).cloned().unwrap_or_default()
    }

    /// Events whose name starts with `prefix`, case-insensitively.
    ///
    /// An empty prefix returns every event, uncapped. Otherwise results are
    /// capped at the configured search limit.
    pub fn search_by_name(&self, prefix: &str) -> Vec<Arc<Event>> {
        if prefix.is_empty() {
            return self.by_id.values().cloned().collect();
        }
        self.names
            .search_limited(prefix, self.config.search_limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Indexed events overlapping `[start, end)`, ordered by start.
    pub fn find_conflicts(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Arc<Event>> {
        let mut found: Vec<Arc<Event>> = self
            .intervals
            .find_overlapping(start.timestamp_millis(), end.timestamp_millis())
            .into_iter()
            .cloned()
            .collect();
        found.sort_by_key(|e| (e.start_ms(), e.id));
        found
    }

    /// Every unordered pair of overlapping events.
    ///
    /// O(n^2) in the worst case; there is no cap.
    pub fn get_all_conflicts(&self) -> Vec<ConflictPair> {
        self.intervals
            .find_all_conflicts()
            .into_iter()
            .map(|(first, second)| ConflictPair {
                first: Arc::clone(first),
                second: Arc::clone(second),
            })
            .collect()
    }

    /// Events starting within `start..=end`, ascending.
    pub fn get_events_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Arc<Event>> {
        let lo = (start.timestamp_millis(), EventId::MIN);
        let hi = (end.timestamp_millis(), EventId::MAX);
        self.timeline.range_query(&lo, &hi).into_iter().cloned().collect()
    }

    /// Every event, ascending by start.
    pub fn get_all_events_sorted(&self) -> Vec<Arc<Event>> {
        self.timeline.to_vec().into_iter().cloned().collect()
    }

    /// The earliest event in the upcoming queue.
    pub fn get_next_upcoming(&self) -> Option<Arc<Event>> {
        self.upcoming.peek().map(|item| Arc::clone(&item.data))
    }

    /// Up to `count` events from the upcoming queue, earliest first.
    pub fn get_upcoming_events(&self, count: usize) -> Vec<Arc<Event>> {
        self.upcoming
            .sorted()
            .into_iter()
            .take(count)
            .map(|item| Arc::clone(&item.data))
            .collect()
    }

    /// Aggregate counters and a capped sample of conflicts.
    pub fn get_stats(&self) -> SchedulerStats {
        let conflicts = self.get_all_conflicts();
        let graph = self.dependencies.info();
        SchedulerStats {
            total_events: self.by_id.len(),
            conflicts_count: conflicts.len(),
            conflicts: conflicts
                .into_iter()
                .take(self.config.stats_conflict_limit)
                .collect(),
            next_upcoming: self.get_next_upcoming(),
            upcoming_count: self.upcoming.len(),
            timeline_height: self.timeline.height(),
            interval_height: self.intervals.height(),
            graph_nodes: graph.nodes,
            graph_edges: graph.edges,
            graph_has_cycle: graph.has_cycle,
            structures: structure_catalog(),
        }
    }

    // -----------------------------------------------------------------------
    // Internal fan-out
    // -----------------------------------------------------------------------

    fn index_event(&mut self, event: Arc<Event>) {
        if self.by_id.has(&event.id) {
            self.unindex(&event.id);
        }

        let start = event.start_ms();
        self.timeline.insert((start, event.id), Arc::clone(&event));
        self.intervals
            .insert(start, event.end_ms(), Arc::clone(&event));
        if start > self.clock.now_ms() {
            self.upcoming.insert(start, Arc::clone(&event));
        }

        let day = event.day_key();
        if let Some(bucket) = self.by_day.get_mut(&day) {
            bucket.push(Arc::clone(&event));
        } else {
            self.by_day.set(day, vec![Arc::clone(&event)]);
        }

        self.names.insert(&event.name, Arc::clone(&event));
        self.dependencies.add_node(event.id);
        self.by_id.set(event.id, event);
    }

    fn unindex(&mut self, id: &EventId) -> Option<Arc<Event>> {
        let event = self.by_id.delete(id)?;

        self.timeline.delete(&(event.start_ms(), event.id));
        self.intervals.delete(&event.id);

        let day = event.day_key();
        if let Some(bucket) = self.by_day.get_mut(&day) {
            bucket.retain(|other| other.id != event.id);
            if bucket.is_empty() {
                self.by_day.delete(&day);
            }
        }

        if self
            .names
            .get(&event.name)
            .is_some_and(|holder| holder.id == event.id)
        {
            self.names.delete(&event.name);
            let lowered = event.name.to_lowercase();
            let namesake = self
                .by_id
                .values()
                .filter(|other| other.name.to_lowercase() == lowered)
                .max_by_key(|other| (other.created_at, other.id))
                .cloned();
            if let Some(namesake) = namesake {
                self.names.insert(&lowered, namesake);
            }
        }

        self.dependencies.remove_node(&event.id);
        self.rebuild_upcoming();
        Some(event)
    }

    fn resolve(&self, ids: &[EventId]) -> Vec<Arc<Event>> {
        ids.iter().filter_map(|id| self.get_event_by_id(id)).collect()
    }
}

/// Descriptions of the six structures, reported with the stats.
fn structure_catalog() -> Vec<StructureInfo> {
    [
        (
            "timeline",
            "Binary Search Tree",
            "Events sorted by start for listing and range queries",
            "O(log n) average search/insert, O(n) worst case",
        ),
        (
            "intervals",
            "AVL Interval Tree",
            "Overlap and conflict detection",
            "O(log n + k) overlap query, O(n^2) all-pairs",
        ),
        (
            "upcoming",
            "Min Heap",
            "Priority queue of future events",
            "O(1) peek, O(log n) insert, O(n) rebuild",
        ),
        (
            "identity",
            "Hash Map",
            "Lookup by event id and by calendar day",
            "O(1) average",
        ),
        (
            "names",
            "Trie",
            "Case-insensitive prefix search on names",
            "O(m) where m = prefix length",
        ),
        (
            "dependencies",
            "Directed Graph",
            "Event precedence with cycle prevention",
            "O(V + E) admission check and topological sort",
        ),
    ]
    .into_iter()
    .map(|(name, kind, purpose, complexity)| StructureInfo {
        name: name.to_owned(),
        kind: kind.to_owned(),
        purpose: purpose.to_owned(),
        complexity: complexity.to_owned(),
    })
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use agenda_types::EventStatus;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::clock::FixedClock;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn event(name: &str, start: i64, end: i64) -> Event {
        Event {
            id: EventId::new(),
            name: name.to_owned(),
            start: at(start),
            end: at(end),
            description: None,
            location: None,
            capacity: None,
            status: EventStatus::Published,
            created_at: at(0),
        }
    }

    fn scheduler_at(now: i64) -> (Scheduler<Arc<FixedClock>>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let scheduler = Scheduler::with_clock(SchedulerConfig::default(), Arc::clone(&clock));
        (scheduler, clock)
    }

    fn ids(events: &[Arc<Event>]) -> Vec<EventId> {
        events.iter().map(|e| e.id).collect()
    }

    /// Cross-structure membership and heap checks.
    fn assert_consistent<C: Clock>(s: &Scheduler<C>) {
        let n = s.by_id.len();
        assert_eq!(s.timeline.len(), n);
        assert_eq!(s.intervals.len(), n);
        assert_eq!(s.dependencies.node_count(), n);
        assert_eq!(s.by_day.values().map(Vec::len).sum::<usize>(), n);

        for event in s.by_id.values() {
            let key = (event.start_ms(), event.id);
            assert_eq!(s.timeline.search(&key).map(|e| e.id), Some(event.id));
            assert!(s.dependencies.contains(&event.id));
            assert!(
                s.intervals
                    .find_overlapping(event.start_ms(), event.end_ms())
                    .iter()
                    .any(|e| e.id == event.id)
            );
            assert!(
                s.get_events_by_date(&event.day_key())
                    .iter()
                    .any(|e| e.id == event.id)
            );
        }

        let heap = s.upcoming.as_slice();
        for child in 1..heap.len() {
            assert!(heap[(child - 1) / 2].priority <= heap[child].priority);
        }
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn overlapping_add_reports_conflict() {
        let (mut s, _) = scheduler_at(0);
        let first = s.add_event(event("Standup", 10, 20));
        assert!(!first.has_conflicts);

        let second = event("Review", 15, 25);
        let second_id = second.id;
        let outcome = s.add_event(second);
        assert!(outcome.has_conflicts);
        assert_eq!(ids(&outcome.conflicts), vec![first.event.id]);

        let found: Vec<EventId> = s
            .find_conflicts(at(10), at(20))
            .iter()
            .map(|e| e.id)
            .filter(|id| *id != first.event.id)
            .collect();
        assert_eq!(found, vec![second_id]);
    }

    #[test]
    fn deleted_event_disappears_everywhere() {
        let (mut s, _) = scheduler_at(0);
        let e = event("Solo", 5, 10);
        let id = e.id;
        s.add_event(e.clone());

        assert!(s.delete_event(&e).is_some());
        assert!(s.get_event_by_id(&id).is_none());
        assert!(s.get_events_in_range(at(0), at(100)).is_empty());
        assert!(s.search_by_name("solo").is_empty());
        assert!(s.get_events_by_date("1970-01-01").is_empty());
        assert!(s.get_next_upcoming().is_none());
        assert!(s.delete_event(&e).is_none());
        assert_consistent(&s);
    }

    #[test]
    fn reverse_dependency_is_rejected() {
        let (mut s, _) = scheduler_at(0);
        let a = s.add_event(event("A", 10, 20)).event;
        let b = s.add_event(event("B", 30, 40)).event;

        s.add_dependency(a.id, b.id).unwrap();
        let err = s.add_dependency(b.id, a.id).unwrap_err();
        assert!(matches!(err, SchedulerError::Dependency { .. }));

        let order = s.get_execution_order().unwrap();
        assert_eq!(ids(&order), vec![a.id, b.id]);
        assert_eq!(ids(&s.get_dependents(&a.id)), vec![b.id]);
        assert_eq!(ids(&s.get_prerequisites(&b.id)), vec![a.id]);
    }

    #[test]
    fn range_query_returns_middle_three_in_order() {
        let (mut s, _) = scheduler_at(0);
        let added: Vec<Arc<Event>> = (1..=5)
            .map(|i| s.add_event(event(&format!("E{i}"), i * 100, i * 100 + 50)).event)
            .collect();

        let hits = s.get_events_in_range(at(200), at(400));
        assert_eq!(ids(&hits), ids(&added[1..4]));
    }

    #[test]
    fn prefix_search_finds_both_talks() {
        let (mut s, _) = scheduler_at(0);
        s.add_event(event("Tech Talk", 10, 20));
        s.add_event(event("Tech Fair", 30, 40));

        assert_eq!(s.search_by_name("Tech").len(), 2);
        assert!(s.search_by_name("Music").is_empty());
        assert_eq!(s.search_by_name("").len(), 2);
    }

    // -----------------------------------------------------------------------
    // Engine behavior
    // -----------------------------------------------------------------------

    #[test]
    fn equal_start_times_are_both_range_indexed() {
        let (mut s, _) = scheduler_at(0);
        s.add_event(event("Track A", 100, 200));
        s.add_event(event("Track B", 100, 150));
        assert_eq!(s.get_events_in_range(at(100), at(100)).len(), 2);
        assert_eq!(s.get_all_events_sorted().len(), 2);
        assert_consistent(&s);
    }

    #[test]
    fn upcoming_only_admits_future_events() {
        let (mut s, clock) = scheduler_at(1_000);
        s.add_event(event("Past", 500, 600));
        s.add_event(event("Now", 1_000, 1_100));
        let soon = s.add_event(event("Soon", 2_000, 2_100)).event;
        let later = s.add_event(event("Later", 3_000, 3_100)).event;

        assert_eq!(s.get_next_upcoming().map(|e| e.id), Some(soon.id));
        assert_eq!(ids(&s.get_upcoming_events(5)), vec![soon.id, later.id]);
        assert_eq!(ids(&s.get_upcoming_events(1)), vec![soon.id]);

        clock.set(2_500);
        s.rebuild_upcoming();
        assert_eq!(s.get_next_upcoming().map(|e| e.id), Some(later.id));
    }

    #[test]
    fn update_rekeys_every_structure() {
        let (mut s, _) = scheduler_at(0);
        let old = s.add_event(event("Workshop", 100, 200)).event;
        let mut moved = (*old).clone();
        moved.name = "Lab".to_owned();
        moved.start = at(1_000);
        moved.end = at(1_100);

        s.update_event(&old, moved);
        assert!(s.get_events_in_range(at(0), at(500)).is_empty());
        assert_eq!(s.get_events_in_range(at(900), at(1_000)).len(), 1);
        assert!(s.search_by_name("work").is_empty());
        assert_eq!(s.search_by_name("lab").len(), 1);
        assert_eq!(s.len(), 1);
        assert_consistent(&s);
    }

    #[test]
    fn update_with_stale_snapshot_leaves_no_orphans() {
        let (mut s, _) = scheduler_at(0);
        let original = s.add_event(event("Talk", 100, 200)).event;

        let mut first = (*original).clone();
        first.start = at(300);
        first.end = at(400);
        s.update_event(&original, first);

        // A second writer still holding the original snapshot.
        let mut second = (*original).clone();
        second.start = at(500);
        second.end = at(600);
        s.update_event(&original, second);

        assert_eq!(s.len(), 1);
        assert_eq!(s.get_all_events_sorted().len(), 1);
        assert_eq!(s.get_event_by_id(&original.id).map(|e| e.start_ms()), Some(500));
        assert_consistent(&s);
    }

    #[test]
    fn update_keeps_dependency_edges() {
        let (mut s, _) = scheduler_at(0);
        let a = s.add_event(event("A", 10, 20)).event;
        let b = s.add_event(event("B", 30, 40)).event;
        s.add_dependency(a.id, b.id).unwrap();

        let mut renamed = (*b).clone();
        renamed.name = "B2".to_owned();
        s.update_event(&b, renamed);
        assert_eq!(s.dependencies(), vec![(a.id, b.id)]);

        s.delete_event(&a);
        assert!(s.dependencies().is_empty());
    }

    #[test]
    fn dependency_on_unknown_event_is_refused() {
        let (mut s, _) = scheduler_at(0);
        let a = s.add_event(event("A", 10, 20)).event;
        let ghost = EventId::new();
        assert!(matches!(
            s.add_dependency(a.id, ghost),
            Err(SchedulerError::UnknownEvent(id)) if id == ghost
        ));
        assert_eq!(s.get_stats().graph_edges, 0);
    }

    #[test]
    fn shared_name_loses_trie_entry_only_for_its_holder() {
        let (mut s, _) = scheduler_at(0);
        let first = s.add_event(event("Lunch", 10, 20)).event;
        let second = s.add_event(event("lunch", 30, 40)).event;
        assert_eq!(ids(&s.search_by_name("lun")), vec![second.id]);

        // Deleting the shadowed event must not evict the holder.
        s.delete_event(&first);
        assert_eq!(ids(&s.search_by_name("lun")), vec![second.id]);
    }

    #[test]
    fn deleting_name_holder_promotes_a_namesake() {
        let (mut s, _) = scheduler_at(0);
        let first = s.add_event(event("Lunch", 10, 20)).event;
        let holder = s.add_event(event("LUNCH", 30, 40)).event;
        assert_eq!(ids(&s.search_by_name("lunch")), vec![holder.id]);

        s.delete_event(&holder);
        assert_eq!(ids(&s.search_by_name("lunch")), vec![first.id]);

        s.delete_event(&first);
        assert!(s.search_by_name("lunch").is_empty());
    }

    #[test]
    fn stats_cap_conflict_sample() {
        let (mut s, _) = scheduler_at(0);
        for i in 0..6 {
            s.add_event(event(&format!("Overlap {i}"), 0, 100 + i));
        }
        let stats = s.get_stats();
        assert_eq!(stats.total_events, 6);
        assert_eq!(stats.conflicts_count, 15);
        assert_eq!(stats.conflicts.len(), 10);
        assert_eq!(stats.upcoming_count, 0);
        assert_eq!(stats.graph_nodes, 6);
        assert_eq!(stats.structures.len(), 6);
        assert!(!stats.graph_has_cycle);
    }

    #[test]
    fn initialize_replaces_previous_contents() {
        let (mut s, _) = scheduler_at(0);
        s.add_event(event("Stale", 10, 20));
        assert!(!s.is_initialized());

        let loaded = s.initialize(vec![event("A", 10, 20), event("B", 30, 40)]);
        assert_eq!(loaded, 2);
        assert!(s.is_initialized());
        assert!(s.search_by_name("stale").is_empty());
        assert_consistent(&s);

        s.clear();
        assert!(!s.is_initialized());
        assert!(s.is_empty());
    }

    #[tokio::test]
    async fn initialize_from_source_loads_everything() {
        let (mut s, _) = scheduler_at(0);
        let source = vec![event("A", 10, 20), event("B", 30, 40), event("C", 35, 45)];
        let loaded = s.initialize_from(&source).await.unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(s.get_all_conflicts().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[test]
    fn remove_then_reindex_round_trips() {
        let (mut s, _) = scheduler_at(0);
        let e = s.add_event(event("Keynote", 100, 200)).event;
        s.add_event(event("Panel", 150, 250));

        let before = (
            ids(&s.find_conflicts(at(100), at(200))),
            ids(&s.get_events_in_range(at(0), at(1_000))),
            ids(&s.search_by_name("key")),
            ids(&s.get_upcoming_events(10)),
        );

        s.delete_event(&e);
        s.add_event((*e).clone());

        let after = (
            ids(&s.find_conflicts(at(100), at(200))),
            ids(&s.get_events_in_range(at(0), at(1_000))),
            ids(&s.search_by_name("key")),
            ids(&s.get_upcoming_events(10)),
        );
        assert_eq!(before, after);
        assert_consistent(&s);
    }

    #[test]
    fn random_mutations_keep_structures_in_sync() {
        let mut rng = StdRng::seed_from_u64(2024);
        let (mut s, clock) = scheduler_at(50_000);
        let mut live: Vec<Arc<Event>> = Vec::new();

        for step in 0..300 {
            let roll = rng.random_range(0..10);
            if roll < 5 || live.is_empty() {
                let start = rng.random_range(0..100_000);
                let len = rng.random_range(1..5_000);
                let name = format!("event {}", rng.random_range(0..40));
                live.push(s.add_event(event(&name, start, start + len)).event);
            } else if roll < 8 {
                let idx = rng.random_range(0..live.len());
                let mut next = (*live[idx]).clone();
                next.start = at(rng.random_range(0..100_000));
                next.end = at(next.start_ms() + rng.random_range(1..5_000));
                live[idx] = s.update_event(&live[idx].clone(), next).event;
            } else {
                let victim = live.swap_remove(rng.random_range(0..live.len()));
                assert!(s.delete_event(&victim).is_some());
            }

            if step % 50 == 0 {
                clock.advance(1_000);
            }
            assert_eq!(s.len(), live.len());
            assert_consistent(&s);
        }

        s.rebuild_upcoming();
        let now = clock.now_ms();
        let expected_next = live
            .iter()
            .filter(|e| e.start_ms() > now)
            .map(|e| e.start_ms())
            .min();
        assert_eq!(s.get_next_upcoming().map(|e| e.start_ms()), expected_next);
    }

    #[test]
    fn overlap_matches_definition_for_every_pair() {
        let (mut s, _) = scheduler_at(0);
        let spans = [(0, 10), (10, 20), (5, 15), (20, 30), (25, 26), (0, 100)];
        let events: Vec<Arc<Event>> = spans
            .iter()
            .map(|&(a, b)| s.add_event(event("x", a, b)).event)
            .collect();

        for a in &events {
            let hits = s.find_conflicts(a.start, a.end);
            for b in &events {
                let expected = a.start < b.end && b.start < a.end;
                assert_eq!(hits.iter().any(|h| h.id == b.id), expected);
            }
        }
    }
}
