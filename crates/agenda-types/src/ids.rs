//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Events and registrations are identified by strongly-typed IDs so that
//! one can never be confused with the other, or with any other UUID
//! flowing through the HTTP layer. IDs use UUID v7 (time-ordered) for
//! efficient database indexing.
//!
//! The `new()` constructors generate ids application-side, which is how
//! every insert works (the store, memory-only mode, tests, seed data).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an indexed event.
    ///
    /// Immutable once assigned: re-keying an event is always a
    /// remove-then-insert under the same id.
    EventId
}

define_id! {
    /// Unique identifier for an attendee's registration to an event.
    RegistrationId
}

impl EventId {
    /// Smallest possible identifier. Used as a lower bound in range scans.
    pub const MIN: Self = Self(Uuid::nil());

    /// Largest possible identifier. Used as an upper bound in range scans.
    pub const MAX: Self = Self(Uuid::from_u128(u128::MAX));
}
