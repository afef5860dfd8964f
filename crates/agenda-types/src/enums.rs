//! Enumeration types for event and registration records.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Publication status of an event.
///
/// Carried through the engine unchanged: no index ever branches on it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventStatus {
    /// Created but not yet visible to attendees.
    #[default]
    Draft,
    /// Open for registration.
    Published,
    /// Called off by the organizer.
    Cancelled,
    /// Already took place.
    Completed,
}

impl EventStatus {
    /// The database / wire representation of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl core::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string does not name a known [`EventStatus`]
/// or [`RegistrationStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl core::str::FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Lifecycle of an attendee's registration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum RegistrationStatus {
    /// Signed up, not yet arrived.
    #[default]
    Registered,
    /// Arrived at the event.
    CheckedIn,
    /// Withdrawn by the attendee or the organizer.
    Cancelled,
}

impl RegistrationStatus {
    /// The database / wire representation of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::CheckedIn => "checked-in",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RegistrationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "checked-in" => Ok(Self::CheckedIn),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}
