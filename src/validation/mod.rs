//! Input validation applied before any write.
//!
//! Rules are small functions that push [`FieldIssue`]s into a shared
//! [`ValidationErrors`] accumulator. Each write operation has its own entry
//! point composing exactly the rules it needs. Reads of stored rows run no
//! validation.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    NewReservation, NewRoom, Patch, ROOM_NAME_MAX_CHARS, Reservation, ReservationPatch, RoomPatch,
    TimeSlot,
};

/// Field name used for room names in error details.
pub const NAME_FIELD: &str = "name";
/// Field name used for reservation starts in error details.
pub const FROM_FIELD: &str = "from_reserve";
/// Field name used for reservation ends in error details.
pub const TO_FIELD: &str = "to_reserve";

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldIssue {
    /// Offending field (wire name).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

/// Every issue found while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Records an issue.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns `true` if no rule failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consumes the accumulator, returning the issues in the order they
    /// were found.
    #[must_use]
    pub fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }

    /// Returns `Ok(())` when empty, the accumulated errors otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one issue was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ── Rules ───────────────────────────────────────────────────────────────

/// Name must hold between 1 and [`ROOM_NAME_MAX_CHARS`] characters.
pub fn check_room_name(errors: &mut ValidationErrors, name: &str) {
    let len = name.chars().count();
    if len == 0 {
        errors.push(NAME_FIELD, "must not be empty");
    } else if len > ROOM_NAME_MAX_CHARS {
        errors.push(
            NAME_FIELD,
            format!("must be at most {ROOM_NAME_MAX_CHARS} characters, got {len}"),
        );
    }
}

/// A slot must start strictly before it ends.
pub fn check_time_order(errors: &mut ValidationErrors, slot: &TimeSlot) {
    if slot.from >= slot.to {
        errors.push(FROM_FIELD, format!("must be earlier than {TO_FIELD}"));
    }
}

/// A newly requested start must lie strictly in the future.
pub fn check_starts_after(errors: &mut ValidationErrors, from: NaiveDateTime, now: NaiveDateTime) {
    if from <= now {
        errors.push(FROM_FIELD, "must be later than the current time");
    }
}

/// A required field may be absent from a patch but never explicitly null.
pub fn check_not_null<T>(errors: &mut ValidationErrors, field: &str, value: &Patch<T>) {
    if matches!(value, Patch::Null) {
        errors.push(field, "must not be null");
    }
}

// ── Per-operation entry points ──────────────────────────────────────────

/// Validates a room before it is created.
///
/// # Errors
///
/// Returns every failed rule.
pub fn validate_new_room(room: &NewRoom) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_room_name(&mut errors, &room.name);
    errors.into_result()
}

/// Validates a room patch: `name` may be omitted but not nulled.
///
/// # Errors
///
/// Returns every failed rule.
pub fn validate_room_patch(patch: &RoomPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_not_null(&mut errors, NAME_FIELD, &patch.name);
    if let Patch::Value(name) = &patch.name {
        check_room_name(&mut errors, name);
    }
    errors.into_result()
}

/// Validates a reservation before it is created.
///
/// # Errors
///
/// Returns every failed rule.
pub fn validate_new_reservation(
    reservation: &NewReservation,
    now: NaiveDateTime,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_starts_after(&mut errors, reservation.slot.from, now);
    check_time_order(&mut errors, &reservation.slot);
    errors.into_result()
}

/// Validates a reservation patch against the stored reservation and
/// returns the merged interval.
///
/// The future-start rule only applies when the patch changes
/// `from_time`; the ordering rule always applies to the merged interval.
///
/// # Errors
///
/// Returns every failed rule.
pub fn validate_reservation_update(
    existing: &Reservation,
    patch: &ReservationPatch,
    now: NaiveDateTime,
) -> Result<TimeSlot, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_not_null(&mut errors, FROM_FIELD, &patch.from_time);
    check_not_null(&mut errors, TO_FIELD, &patch.to_time);
    if let Patch::Value(from) = patch.from_time
        && from != existing.from_time
    {
        check_starts_after(&mut errors, from, now);
    }
    let slot = existing.rescheduled(patch);
    check_time_order(&mut errors, &slot);
    errors.into_result().map(|()| slot)
}
