//! CRUD on the `events` table and the startup seed for the engine.
//!
//! Ids are generated application-side (UUID v7) so the caller knows the id
//! before the row is written. Rows are converted to domain [`Event`]s on
//! the way out; a row that violates a domain constraint surfaces as
//! [`DbError::InvalidRow`] rather than being skipped.

use std::future::Future;

use agenda_core::EventSource;
use agenda_types::{Event, EventId, EventStatus, NewEvent};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const SELECT_COLUMNS: &str =
    "id, name, start_time, end_time, description, location, capacity, status, created_at";

/// Operations on the `events` table.
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    /// Create a store over a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every event, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::InvalidRow`] if a row cannot be converted.
    pub async fn load_all(&self) -> Result<Vec<Event>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM events ORDER BY start_time, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let events = rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = events.len(), "Loaded events");
        Ok(events)
    }

    /// The event with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn get(&self, id: EventId) -> Result<Option<Event>, DbError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Insert a new event and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails (including a
    /// violated `start_time < end_time` check).
    pub async fn insert(&self, new: NewEvent) -> Result<Event, DbError> {
        let id = EventId::new();
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (id, name, start_time, end_time, description, location, capacity, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(&new.name)
        .bind(new.start)
        .bind(new.end)
        .bind(&new.description)
        .bind(&new.location)
        .bind(capacity_to_db(id, new.capacity)?)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(%id, "Inserted event");
        Event::try_from(row)
    }

    /// Replace every client-editable field of an event.
    ///
    /// Returns `None` when no row has the id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update or row conversion fails.
    pub async fn update(&self, id: EventId, new: NewEvent) -> Result<Option<Event>, DbError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events
             SET name = $2, start_time = $3, end_time = $4, description = $5,
                 location = $6, capacity = $7, status = $8
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(&new.name)
        .bind(new.start)
        .bind(new.end)
        .bind(&new.description)
        .bind(&new.location)
        .bind(capacity_to_db(id, new.capacity)?)
        .bind(new.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(%id, found = row.is_some(), "Updated event");
        row.map(Event::try_from).transpose()
    }

    /// Delete an event. Returns `false` when no row had the id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete(&self, id: EventId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        tracing::debug!(%id, deleted, "Deleted event");
        Ok(deleted)
    }
}

impl EventSource for EventStore {
    type Error = DbError;

    fn load_all(&self) -> impl Future<Output = Result<Vec<Event>, DbError>> + Send {
        Self::load_all(self)
    }
}

/// A row from the `events` table.
///
/// Uses runtime types rather than compile-time checked types to avoid
/// requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Interval start.
    pub start_time: DateTime<Utc>,
    /// Interval end.
    pub end_time: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
    /// Venue.
    pub location: Option<String>,
    /// Attendee cap (`INTEGER`, non-negative by constraint).
    pub capacity: Option<i32>,
    /// Status as stored (`snake_case`).
    pub status: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, DbError> {
        let invalid = |reason: String| DbError::InvalidRow { id: row.id, reason };

        let status: EventStatus = row
            .status
            .parse()
            .map_err(|err: agenda_types::UnknownStatus| invalid(err.to_string()))?;
        let capacity = row
            .capacity
            .map(u32::try_from)
            .transpose()
            .map_err(|err| invalid(format!("capacity out of range: {err}")))?;

        Ok(Self {
            id: EventId::from(row.id),
            name: row.name,
            start: row.start_time,
            end: row.end_time,
            description: row.description,
            location: row.location,
            capacity,
            status,
            created_at: row.created_at,
        })
    }
}

fn capacity_to_db(id: EventId, capacity: Option<u32>) -> Result<Option<i32>, DbError> {
    capacity
        .map(i32::try_from)
        .transpose()
        .map_err(|err| DbError::InvalidRow {
            id: id.into_inner(),
            reason: format!("capacity out of range: {err}"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(status: &str, capacity: Option<i32>) -> EventRow {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        EventRow {
            id: Uuid::now_v7(),
            name: "Launch".to_owned(),
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            description: None,
            location: Some("Hall A".to_owned()),
            capacity,
            status: status.to_owned(),
            created_at: start,
        }
    }

    #[test]
    fn row_converts_to_event() {
        let source = row("published", Some(120));
        let event = Event::try_from(source.clone()).unwrap();
        assert_eq!(event.id.into_inner(), source.id);
        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.capacity, Some(120));
        assert_eq!(event.location.as_deref(), Some("Hall A"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = Event::try_from(row("postponed", None));
        assert!(matches!(result, Err(DbError::InvalidRow { .. })));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let result = Event::try_from(row("draft", Some(-1)));
        assert!(matches!(result, Err(DbError::InvalidRow { .. })));
    }

    #[test]
    fn oversized_capacity_is_rejected_before_writing() {
        let id = EventId::new();
        assert_eq!(capacity_to_db(id, Some(5)).unwrap(), Some(5));
        assert!(capacity_to_db(id, Some(u32::MAX)).is_err());
        assert_eq!(capacity_to_db(id, None).unwrap(), None);
    }
}
