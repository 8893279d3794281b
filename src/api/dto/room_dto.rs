//! Meeting room request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{NewRoom, Patch, Room, RoomId, RoomPatch};

/// Request body for `POST /meeting_rooms`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RoomCreateRequest {
    /// Unique name, 1 to 100 characters.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl From<RoomCreateRequest> for NewRoom {
    fn from(req: RoomCreateRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

/// Request body for `PATCH /meeting_rooms/{id}`.
///
/// Omitted fields are left untouched. `description: null` clears the
/// description; `name: null` is rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RoomUpdateRequest {
    /// New name.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    /// New description, or `null` to clear it.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
}

impl From<RoomUpdateRequest> for RoomPatch {
    fn from(req: RoomUpdateRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

/// A meeting room as returned by every room endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    /// Room identifier.
    pub id: RoomId,
    /// Room name.
    pub name: String,
    /// Room description.
    pub description: Option<String>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            description: room.description,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn create_ignores_unknown_fields() {
        let Ok(req) =
            serde_json::from_str::<RoomCreateRequest>(r#"{"name": "A101", "floor": 2}"#)
        else {
            panic!("extra field rejected");
        };
        assert_eq!(req.name, "A101");
        assert_eq!(req.description, None);
    }

    #[test]
    fn create_requires_name() {
        assert!(serde_json::from_str::<RoomCreateRequest>(r#"{"description": "x"}"#).is_err());
        assert!(serde_json::from_str::<RoomCreateRequest>(r#"{"name": null}"#).is_err());
    }

    #[test]
    fn update_distinguishes_null_from_missing() {
        let Ok(req) = serde_json::from_str::<RoomUpdateRequest>(r#"{"description": null}"#) else {
            panic!("patch rejected");
        };
        let patch = RoomPatch::from(req);
        assert_eq!(patch.name, Patch::Absent);
        assert_eq!(patch.description, Patch::Null);
    }

    #[test]
    fn response_uses_flat_shape() {
        let body = RoomResponse::from(Room {
            id: RoomId::new(3),
            name: "A101".to_string(),
            description: None,
        });
        let Ok(json) = serde_json::to_value(&body) else {
            panic!("serialization failed");
        };
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "name": "A101", "description": null})
        );
    }
}
