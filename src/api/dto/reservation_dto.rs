//! Reservation request and response bodies.
//!
//! Request bodies are strict: unknown fields are rejected, which also
//! stops a `meetingroom_id` from sneaking into an update.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::naive_time;
use crate::domain::{
    NewReservation, Patch, Reservation, ReservationId, ReservationPatch, RoomId, TimeSlot,
};

/// Request body for `POST /reservations`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReservationCreateRequest {
    /// Start of the booking; must lie in the future.
    #[serde(deserialize_with = "naive_time::required")]
    pub from_reserve: NaiveDateTime,
    /// End of the booking; must be after `from_reserve`.
    #[serde(deserialize_with = "naive_time::required")]
    pub to_reserve: NaiveDateTime,
    /// Room to book.
    pub meetingroom_id: RoomId,
}

impl From<ReservationCreateRequest> for NewReservation {
    fn from(req: ReservationCreateRequest) -> Self {
        Self {
            room_id: req.meetingroom_id,
            slot: TimeSlot::new(req.from_reserve, req.to_reserve),
        }
    }
}

/// Request body for `PATCH /reservations/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReservationUpdateRequest {
    /// New start; must lie in the future.
    #[serde(default, deserialize_with = "naive_time::patch")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub from_reserve: Patch<NaiveDateTime>,
    /// New end.
    #[serde(default, deserialize_with = "naive_time::patch")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub to_reserve: Patch<NaiveDateTime>,
}

impl From<ReservationUpdateRequest> for ReservationPatch {
    fn from(req: ReservationUpdateRequest) -> Self {
        Self {
            from_time: req.from_reserve,
            to_time: req.to_reserve,
        }
    }
}

/// A reservation as returned by every reservation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    /// Reservation identifier.
    pub id: ReservationId,
    /// Booked room.
    pub meetingroom_id: RoomId,
    /// Start of the booking.
    pub from_reserve: NaiveDateTime,
    /// End of the booking.
    pub to_reserve: NaiveDateTime,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            meetingroom_id: r.room_id,
            from_reserve: r.from_time,
            to_reserve: r.to_time,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn create_accepts_minute_precision() {
        let Ok(req) = serde_json::from_str::<ReservationCreateRequest>(
            r#"{"from_reserve": "2030-01-01T10:00", "to_reserve": "2030-01-01T11:00", "meetingroom_id": 1}"#,
        ) else {
            panic!("valid body rejected");
        };
        let new = NewReservation::from(req);
        assert_eq!(new.room_id, RoomId::new(1));
        assert!(new.slot.from < new.slot.to);
    }

    #[test]
    fn create_rejects_unknown_fields() {
        let result = serde_json::from_str::<ReservationCreateRequest>(
            r#"{"from_reserve": "2030-01-01T10:00", "to_reserve": "2030-01-01T11:00", "meetingroom_id": 1, "user_id": 5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn update_rejects_room_change() {
        let result = serde_json::from_str::<ReservationUpdateRequest>(r#"{"meetingroom_id": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_keeps_tri_state() {
        let Ok(req) = serde_json::from_str::<ReservationUpdateRequest>(
            r#"{"from_reserve": null, "to_reserve": "2030-01-01T12:00"}"#,
        ) else {
            panic!("patch rejected");
        };
        let patch = ReservationPatch::from(req);
        assert_eq!(patch.from_time, Patch::Null);
        assert!(matches!(patch.to_time, Patch::Value(_)));

        let Ok(empty) = serde_json::from_str::<ReservationUpdateRequest>("{}") else {
            panic!("empty patch rejected");
        };
        assert_eq!(ReservationPatch::from(empty), ReservationPatch::default());
    }

    #[test]
    fn response_uses_wire_names() {
        let Some(from) = chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
        else {
            panic!("valid date");
        };
        let body = ReservationResponse::from(Reservation {
            id: ReservationId::new(4),
            room_id: RoomId::new(1),
            from_time: from,
            to_time: from + chrono::Duration::hours(1),
        });
        let Ok(json) = serde_json::to_value(&body) else {
            panic!("serialization failed");
        };
        assert_eq!(
            json,
            serde_json::json!({
                "id": 4,
                "meetingroom_id": 1,
                "from_reserve": "2030-01-01T10:00:00",
                "to_reserve": "2030-01-01T11:00:00"
            })
        );
    }
}
