//! Reservation entity and the interval-overlap rule.
//!
//! Reservations occupy half-open intervals `[from_time, to_time)`. Two
//! reservations of the same room conflict when
//! `a.from_time < b.to_time && a.to_time > b.from_time`; intervals that
//! merely touch (`a.to_time == b.from_time`) do not.

use chrono::NaiveDateTime;

use super::{Patch, ReservationId, RoomId};

/// A half-open time interval `[from, to)` in naive local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    /// Inclusive start.
    pub from: NaiveDateTime,
    /// Exclusive end.
    pub to: NaiveDateTime,
}

impl TimeSlot {
    /// Creates a slot without checking ordering; see
    /// [`crate::validation`] for the `from < to` rule.
    #[must_use]
    pub const fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// Returns `true` if the two slots share at least one instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.from < other.to && self.to > other.from
    }
}

/// A stored booking of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Store-assigned identifier.
    pub id: ReservationId,
    /// Booked room; immutable after creation.
    pub room_id: RoomId,
    /// Start of the booking.
    pub from_time: NaiveDateTime,
    /// End of the booking.
    pub to_time: NaiveDateTime,
}

impl Reservation {
    /// The interval this reservation occupies.
    #[must_use]
    pub const fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.from_time, self.to_time)
    }

    /// Merges a patch over the current interval.
    ///
    /// Null fields are treated like absent ones; validation rejects them
    /// before this is reached.
    #[must_use]
    pub fn rescheduled(&self, patch: &ReservationPatch) -> TimeSlot {
        TimeSlot::new(
            patch.from_time.as_value().copied().unwrap_or(self.from_time),
            patch.to_time.as_value().copied().unwrap_or(self.to_time),
        )
    }
}

/// Input for creating a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    /// Room to book.
    pub room_id: RoomId,
    /// Requested interval.
    pub slot: TimeSlot,
}

/// Partial update of a reservation's interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationPatch {
    /// New start.
    pub from_time: Patch<NaiveDateTime>,
    /// New end.
    pub to_time: Patch<NaiveDateTime>,
}

/// Finds the first reservation of `room_id` that overlaps `candidate`.
///
/// `exclude` removes one reservation from the comparison set, which lets an
/// update be checked against every other booking of the room but not
/// against itself. Reservations of other rooms are ignored.
pub fn find_overlap<'a, I>(
    room_id: RoomId,
    candidate: TimeSlot,
    exclude: Option<ReservationId>,
    existing: I,
) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing.into_iter().find(|r| {
        r.room_id == room_id && Some(r.id) != exclude && candidate.overlaps(&r.slot())
    })
}
