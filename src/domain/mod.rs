//! Domain layer: entities, identifiers, the overlap rule, and access control.
//!
//! Nothing in here touches the store or HTTP; repositories and handlers
//! build on these types.

pub mod clock;
pub mod identity;
pub mod ids;
pub mod patch;
pub mod reservation;
pub mod room;

pub use clock::{Clock, FixedClock, SystemClock};
pub use identity::{Access, AccessPolicy, Identity, Operation};
pub use ids::{ReservationId, RoomId};
pub use patch::Patch;
pub use reservation::{NewReservation, Reservation, ReservationPatch, TimeSlot, find_overlap};
pub use room::{NewRoom, ROOM_NAME_MAX_CHARS, Room, RoomPatch};
