//! Core entity structs: the indexed [`Event`], attendee
//! [`Registration`]s, and their request forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EventStatus, RegistrationStatus};
use crate::ids::{EventId, RegistrationId};

/// An event record mirrored from the store into the scheduling engine.
///
/// The engine reads only `id`, `name`, `start` and `end`. Everything else
/// is payload that flows through untouched. `start < end` is the caller's
/// responsibility and is not re-validated by any index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Stable unique identifier.
    pub id: EventId,
    /// Display name, also the (case-insensitive) search key.
    pub name: String,
    /// Inclusive start of the half-open interval `[start, end)`.
    pub start: DateTime<Utc>,
    /// Exclusive end of the half-open interval `[start, end)`.
    pub end: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
    /// Venue.
    pub location: Option<String>,
    /// Maximum number of attendees, if limited.
    pub capacity: Option<u32>,
    /// Publication status.
    pub status: EventStatus,
    /// When the record was created in the store.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Start instant as milliseconds since the Unix epoch.
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End instant as milliseconds since the Unix epoch.
    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// Calendar day of `start` in UTC, formatted `YYYY-MM-DD`.
    pub fn day_key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }
}

/// Client-supplied fields for creating or replacing an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Interval start.
    pub start: DateTime<Utc>,
    /// Interval end.
    pub end: DateTime<Utc>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Venue.
    #[serde(default)]
    pub location: Option<String>,
    /// Maximum number of attendees.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Publication status (defaults to [`EventStatus::Draft`]).
    #[serde(default)]
    pub status: EventStatus,
}

impl NewEvent {
    /// Materialize the request into a full [`Event`].
    pub fn into_event(self, id: EventId, created_at: DateTime<Utc>) -> Event {
        Event {
            id,
            name: self.name,
            start: self.start,
            end: self.end,
            description: self.description,
            location: self.location,
            capacity: self.capacity,
            status: self.status,
            created_at,
        }
    }
}

/// An attendee signed up for an event.
///
/// Registrations live only in the store; the scheduling engine never
/// indexes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Registration {
    /// Stable unique identifier.
    pub id: RegistrationId,
    /// The event being attended.
    pub event_id: EventId,
    /// Attendee name.
    pub name: String,
    /// Attendee email.
    pub email: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Ticket tier (e.g. `vip`, `general`).
    pub ticket_type: Option<String>,
    /// Where the registration is in its lifecycle.
    pub status: RegistrationStatus,
    /// When the attendee signed up.
    pub registered_at: DateTime<Utc>,
    /// When the attendee first checked in.
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Client-supplied fields for creating a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewRegistration {
    /// The event to attend.
    pub event_id: EventId,
    /// Attendee name.
    pub name: String,
    /// Attendee email.
    pub email: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Ticket tier.
    #[serde(default)]
    pub ticket_type: Option<String>,
    /// Initial status (defaults to [`RegistrationStatus::Registered`]).
    #[serde(default)]
    pub status: RegistrationStatus,
}

/// Client-editable fields of an existing registration.
///
/// The event a registration belongs to cannot be changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegistrationUpdate {
    /// Attendee name.
    pub name: String,
    /// Attendee email.
    pub email: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Ticket tier.
    #[serde(default)]
    pub ticket_type: Option<String>,
    /// New status.
    pub status: RegistrationStatus,
}

/// Attendance counts across all registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegistrationSummary {
    /// Every registration on record.
    pub total: u64,
    /// Registrations that have checked in.
    pub checked_in: u64,
    /// Registrations that have not checked in (cancelled ones included).
    pub pending: u64,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2031, 3, 9, h, 30, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn day_key_uses_start_in_utc() {
        let event = NewEvent {
            name: String::from("Tech Talk"),
            start: at(23),
            end: at(23) + chrono::Duration::hours(2),
            description: None,
            location: None,
            capacity: None,
            status: EventStatus::Published,
        }
        .into_event(EventId::new(), Utc::now());
        assert_eq!(event.day_key(), "2031-03-09");
    }

    #[test]
    fn millisecond_keys_match_chrono() {
        let event = NewEvent {
            name: String::from("Standup"),
            start: at(9),
            end: at(10),
            description: None,
            location: Some(String::from("Room 4")),
            capacity: Some(12),
            status: EventStatus::Draft,
        }
        .into_event(EventId::new(), Utc::now());
        assert_eq!(event.end_ms() - event.start_ms(), 3_600_000);
    }

    #[test]
    fn new_event_defaults_optional_fields() {
        let body = r#"{"name":"Fair","start":"2031-01-01T10:00:00Z","end":"2031-01-01T12:00:00Z"}"#;
        let parsed: Result<NewEvent, _> = serde_json::from_str(body);
        let parsed = parsed.ok();
        assert_eq!(parsed.as_ref().map(|e| e.status), Some(EventStatus::Draft));
        assert_eq!(parsed.and_then(|e| e.capacity), None);
    }

    #[test]
    fn new_registration_defaults_to_registered() {
        let body = format!(
            r#"{{"event_id":"{}","name":"Ada","email":"ada@example.com"}}"#,
            EventId::new()
        );
        let parsed: Option<NewRegistration> = serde_json::from_str(&body).ok();
        assert_eq!(
            parsed.as_ref().map(|r| r.status),
            Some(RegistrationStatus::Registered)
        );
        assert_eq!(parsed.and_then(|r| r.ticket_type), None);
    }

    #[test]
    fn registration_update_requires_a_status() {
        let body = r#"{"name":"Ada","email":"ada@example.com"}"#;
        assert!(serde_json::from_str::<RegistrationUpdate>(body).is_err());
    }
}
