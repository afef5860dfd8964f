//! REST endpoint handlers.
//!
//! Handlers validate input, talk to the store (when one is configured),
//! and translate engine results into JSON. The engine itself never sees a
//! malformed interval or an unparsable id.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and engine status |
//! | `GET` | `/api/events` | All events sorted by start |
//! | `POST` | `/api/events` | Create an event, reporting conflicts |
//! | `GET` | `/api/events/search?q=` | Prefix search on names |
//! | `GET` | `/api/events/conflicts` | All conflicting pairs, or overlaps with `start`/`end` |
//! | `GET` | `/api/events/upcoming?count=` | Next `count` future events |
//! | `GET` | `/api/events/next` | The next future event |
//! | `GET` | `/api/events/range?start=&end=` | Events starting in a window |
//! | `GET` | `/api/events/stats` | Engine statistics |
//! | `GET` | `/api/events/by-date/{day}` | Events starting on a day |
//! | `GET` | `/api/events/{id}` | Single event |
//! | `PUT` | `/api/events/{id}` | Replace an event |
//! | `DELETE` | `/api/events/{id}` | Delete an event |
//! | `POST` | `/api/events/{id}/dependencies` | `{id}` must precede `to` |
//! | `DELETE` | `/api/events/{id}/dependencies/{to}` | Drop that edge |
//! | `GET` | `/api/events/{id}/dependents` | Transitive dependents |
//! | `GET` | `/api/events/{id}/prerequisites` | Transitive prerequisites |
//! | `GET` | `/api/schedule/order` | Dependency-respecting execution order |

use std::sync::Arc;

use agenda_types::{Event, EventId, NewEvent};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query and body structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/events/search`.
#[derive(Debug, serde::Deserialize)]
pub struct SearchQuery {
    /// Name prefix; empty or absent lists every event.
    pub q: Option<String>,
}

/// Query parameters for `GET /api/events/upcoming`.
#[derive(Debug, serde::Deserialize)]
pub struct UpcomingQuery {
    /// Number of events to return.
    pub count: Option<usize>,
}

/// A time window given as RFC 3339 instants.
///
/// Both fields are optional at the type level so that a missing value is
/// reported as a JSON error rather than a bare extractor rejection.
#[derive(Debug, serde::Deserialize)]
pub struct WindowQuery {
    /// Window start.
    pub start: Option<String>,
    /// Window end.
    pub end: Option<String>,
}

/// Body for `POST /api/events/{id}/dependencies`.
#[derive(Debug, serde::Deserialize)]
pub struct DependencyRequest {
    /// The event that depends on the path event.
    pub to: String,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe with a little engine state.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let scheduler = state.scheduler.read().await;
    Json(json!({
        "status": "ok",
        "initialized": scheduler.is_initialized(),
        "events": scheduler.len(),
        "persistent": state.store.is_some(),
    }))
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// List every event, ascending by start.
pub async fn list_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let events = state.scheduler.read().await.get_all_events_sorted();
    Json(events)
}

/// Create an event and report what it overlaps.
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = payload?;
    validate(&new)?;

    let event = match &state.store {
        Some(store) => store.insert(new).await?,
        None => new.into_event(EventId::new(), Utc::now()),
    };

    let outcome = state.scheduler.write().await.add_event(event);
    tracing::info!(
        id = %outcome.event.id,
        conflicts = outcome.conflicts.len(),
        "Event created"
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Prefix search on event names.
pub async fn search_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let prefix = query.q.unwrap_or_default();
    let events = state.scheduler.read().await.search_by_name(prefix.trim());
    Json(events)
}

/// Conflicts: every overlapping pair, or the events overlapping a window
/// when both `start` and `end` are given.
pub async fn get_conflicts(
    State(state): State<Arc<AppState>>,
    Query(window): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scheduler = state.scheduler.read().await;
    let body = match (window.start.as_deref(), window.end.as_deref()) {
        (None, None) => {
            let pairs = scheduler.get_all_conflicts();
            json!({ "count": pairs.len(), "conflicts": pairs })
        }
        (Some(start), Some(end)) => {
            let (start, end) = parse_window(start, end)?;
            let events = scheduler.find_conflicts(start, end);
            json!({ "count": events.len(), "events": events })
        }
        _ => {
            return Err(ApiError::InvalidRequest(
                "start and end must be given together".to_owned(),
            ));
        }
    };
    Ok(Json(body))
}

/// The next `count` upcoming events.
pub async fn upcoming_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpcomingQuery>,
) -> impl IntoResponse {
    let scheduler = state.scheduler.read().await;
    let count = query
        .count
        .unwrap_or(scheduler.config().upcoming_default_count);
    Json(scheduler.get_upcoming_events(count))
}

/// The single next upcoming event.
pub async fn next_event(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let next = state.scheduler.read().await.get_next_upcoming();
    next.map(Json)
        .ok_or_else(|| ApiError::NotFound("no upcoming events".to_owned()))
}

/// Events starting inside an inclusive window.
pub async fn events_in_range(
    State(state): State<Arc<AppState>>,
    Query(window): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(start), Some(end)) = (window.start.as_deref(), window.end.as_deref()) else {
        return Err(ApiError::InvalidRequest(
            "start and end are required".to_owned(),
        ));
    };
    let (start, end) = parse_window(start, end)?;
    let events = state.scheduler.read().await.get_events_in_range(start, end);
    Ok(Json(events))
}

/// Aggregate engine statistics.
pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.scheduler.read().await.get_stats())
}

/// Events starting on a calendar day (`YYYY-MM-DD`, UTC).
pub async fn events_by_date(
    State(state): State<Arc<AppState>>,
    Path(day): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidRequest(format!("{day}: {e}")))?;
    let events = state.scheduler.read().await.get_events_by_date(&day);
    Ok(Json(events))
}

// ---------------------------------------------------------------------------
// Single event
// ---------------------------------------------------------------------------

/// A single event by id.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let event = state
        .scheduler
        .read()
        .await
        .get_event_by_id(&id)
        .ok_or_else(|| ApiError::NotFound(format!("event {id}")))?;
    Ok(Json(event))
}

/// Replace an event's fields and re-index it.
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let Json(new) = payload?;
    validate(&new)?;

    let stored = match &state.store {
        Some(store) => Some(
            store
                .update(id, new.clone())
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("event {id}")))?,
        ),
        None => None,
    };

    let mut scheduler = state.scheduler.write().await;
    let indexed = scheduler.get_event_by_id(&id);
    let outcome = match (stored, indexed) {
        (Some(event), Some(old)) => scheduler.update_event(&old, event),
        (Some(event), None) => scheduler.add_event(event),
        (None, Some(old)) => {
            let event = new.into_event(id, old.created_at);
            scheduler.update_event(&old, event)
        }
        (None, None) => return Err(ApiError::NotFound(format!("event {id}"))),
    };
    drop(scheduler);

    tracing::info!(%id, conflicts = outcome.conflicts.len(), "Event updated");
    Ok(Json(outcome))
}

/// Delete an event from the store and the engine.
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;

    let deleted_in_store = match &state.store {
        Some(store) => store.delete(id).await?,
        None => false,
    };

    let mut scheduler = state.scheduler.write().await;
    let removed = scheduler
        .get_event_by_id(&id)
        .and_then(|old| scheduler.delete_event(&old));
    drop(scheduler);

    if removed.is_none() && !deleted_in_store {
        return Err(ApiError::NotFound(format!("event {id}")));
    }
    tracing::info!(%id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// Record that the path event must happen before `to`.
pub async fn add_dependency(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    payload: Result<Json<DependencyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let from = parse_id(&id_str)?;
    let Json(request) = payload?;
    let to = parse_id(&request.to)?;

    state.scheduler.write().await.add_dependency(from, to)?;
    Ok((StatusCode::CREATED, Json(json!({ "from": from, "to": to }))))
}

/// Remove the edge `{id} -> {to}`.
pub async fn remove_dependency(
    State(state): State<Arc<AppState>>,
    Path((id_str, to_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let from = parse_id(&id_str)?;
    let to = parse_id(&to_str)?;
    if state.scheduler.write().await.remove_dependency(&from, &to) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("dependency {from} -> {to}")))
    }
}

/// Events that transitively depend on the path event.
pub async fn dependents(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let scheduler = state.scheduler.read().await;
    require_known(&scheduler, &id)?;
    Ok(Json(scheduler.get_dependents(&id)))
}

/// Events the path event transitively depends on.
pub async fn prerequisites(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let scheduler = state.scheduler.read().await;
    require_known(&scheduler, &id)?;
    Ok(Json(scheduler.get_prerequisites(&id)))
}

/// Every event in an order that respects all dependencies.
pub async fn execution_order(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.scheduler.read().await.get_execution_order()?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an [`EventId`] from a string, returning an [`ApiError`] on failure.
fn parse_id(s: &str) -> Result<EventId, ApiError> {
    s.parse::<EventId>()
        .map_err(|e| ApiError::InvalidRequest(format!("invalid event id {s}: {e}")))
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ApiError::InvalidRequest(format!("invalid instant {s}: {e}")))
}

fn parse_window(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    if start > end {
        return Err(ApiError::InvalidRequest(
            "start must not be after end".to_owned(),
        ));
    }
    Ok((start, end))
}

/// Reject requests the engine must never see.
fn validate(new: &NewEvent) -> Result<(), ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("name must not be empty".to_owned()));
    }
    // Intervals are indexed at millisecond precision.
    if new.start.timestamp_millis() >= new.end.timestamp_millis() {
        return Err(ApiError::InvalidRequest(
            "start must be at least one millisecond before end".to_owned(),
        ));
    }
    Ok(())
}

fn require_known(scheduler: &agenda_core::Scheduler, id: &EventId) -> Result<(), ApiError> {
    scheduler
        .get_event_by_id(id)
        .map(|_: Arc<Event>| ())
        .ok_or_else(|| ApiError::NotFound(format!("event {id}")))
}
