//! Caller identity and the authorization matrix.
//!
//! The identity provider turns a credential into an [`Identity`]; the
//! [`AccessPolicy`] decides which [`Operation`]s that identity (or an
//! anonymous caller) may perform.

use std::fmt;
use std::str::FromStr;

use crate::error::BookingError;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Identifier issued by the identity provider.
    pub user_id: i32,
    /// Whether the caller may manage rooms.
    pub is_superuser: bool,
}

/// Operation classes guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// List or fetch rooms.
    RoomRead,
    /// Create, update or delete rooms.
    RoomWrite,
    /// List or fetch reservations.
    ReservationRead,
    /// Create, update or delete reservations.
    ReservationWrite,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoomRead => "room_read",
            Self::RoomWrite => "room_write",
            Self::ReservationRead => "reservation_read",
            Self::ReservationWrite => "reservation_write",
        };
        f.write_str(s)
    }
}

/// Requirement attached to an operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credentials needed.
    Public,
    /// Any verified caller.
    Authenticated,
    /// Verified caller with `is_superuser`.
    Superuser,
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "authenticated" | "user" => Ok(Self::Authenticated),
            "superuser" | "admin" => Ok(Self::Superuser),
            other => Err(format!("unknown access level `{other}`")),
        }
    }
}

/// Maps every [`Operation`] to its [`Access`] requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Requirement for [`Operation::RoomRead`].
    pub room_read: Access,
    /// Requirement for [`Operation::RoomWrite`].
    pub room_write: Access,
    /// Requirement for [`Operation::ReservationRead`].
    pub reservation_read: Access,
    /// Requirement for [`Operation::ReservationWrite`].
    pub reservation_write: Access,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            room_read: Access::Authenticated,
            room_write: Access::Superuser,
            reservation_read: Access::Authenticated,
            reservation_write: Access::Authenticated,
        }
    }
}

impl AccessPolicy {
    /// Requirement for one operation class.
    #[must_use]
    pub const fn requirement(&self, operation: Operation) -> Access {
        match operation {
            Operation::RoomRead => self.room_read,
            Operation::RoomWrite => self.room_write,
            Operation::ReservationRead => self.reservation_read,
            Operation::ReservationWrite => self.reservation_write,
        }
    }

    /// Checks whether `caller` may perform `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`] when credentials are required
    /// but missing, and [`BookingError::Forbidden`] when the caller lacks
    /// superuser rights.
    pub fn authorize(
        &self,
        operation: Operation,
        caller: Option<&Identity>,
    ) -> Result<(), BookingError> {
        match (self.requirement(operation), caller) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(BookingError::Unauthorized),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Superuser, Some(identity)) if identity.is_superuser => Ok(()),
            (Access::Superuser, Some(identity)) => {
                tracing::warn!(user_id = identity.user_id, %operation, "superuser required");
                Err(BookingError::Forbidden)
            }
        }
    }
}
