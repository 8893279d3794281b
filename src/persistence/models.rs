//! Database row types for the `meetingroom` and `reservation` tables.

use chrono::NaiveDateTime;

use crate::domain::{Reservation, Room};

/// A row of the `meetingroom` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    /// Serial primary key.
    pub id: i32,
    /// Unique room name.
    pub name: String,
    /// Nullable description.
    pub description: Option<String>,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        let RoomRow {
            id,
            name,
            description,
        } = row;
        Self {
            id: id.into(),
            name,
            description,
        }
    }
}

/// A row of the `reservation` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReservationRow {
    /// Serial primary key.
    pub id: i32,
    /// Foreign key to `meetingroom.id`.
    pub meetingroom_id: i32,
    /// Inclusive start.
    pub from_reserve: NaiveDateTime,
    /// Exclusive end.
    pub to_reserve: NaiveDateTime,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        let ReservationRow {
            id,
            meetingroom_id,
            from_reserve,
            to_reserve,
        } = row;
        Self {
            id: id.into(),
            room_id: meetingroom_id.into(),
            from_time: from_reserve,
            to_time: to_reserve,
        }
    }
}
