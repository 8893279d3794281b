//! Room service: validation, name pre-check and room CRUD.

use std::sync::Arc;

use crate::domain::{NewRoom, Patch, Reservation, Room, RoomId, RoomPatch};
use crate::error::BookingError;
use crate::persistence::{ReservationRepository, RoomRepository};
use crate::validation::{validate_new_room, validate_room_patch};

/// Orchestration layer for meeting rooms.
///
/// Names are looked up before writing. The unique index still decides
/// races between concurrent writers.
#[derive(Debug, Clone)]
pub struct RoomService {
    rooms: Arc<dyn RoomRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl RoomService {
    /// Creates a new `RoomService`.
    #[must_use]
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            rooms,
            reservations,
        }
    }

    /// Validates and stores a new room.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] for a bad name,
    /// [`BookingError::DuplicateRoomName`] if the name is taken.
    pub async fn create(&self, room: NewRoom) -> Result<Room, BookingError> {
        validate_new_room(&room)?;
        self.ensure_name_free(&room.name, None).await?;

        let room = self.rooms.create(room).await?;
        tracing::info!(room_id = %room.id, name = %room.name, "meeting room created");
        Ok(room)
    }

    /// Fetches one room.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] if it does not exist.
    pub async fn get(&self, id: RoomId) -> Result<Room, BookingError> {
        self.rooms.get_by_id(id).await
    }

    /// Lists every room.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn list(&self) -> Result<Vec<Room>, BookingError> {
        self.rooms.list_all().await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] for a null or malformed name,
    /// [`BookingError::RoomNotFound`] for an unknown id,
    /// [`BookingError::DuplicateRoomName`] if another room has the name.
    pub async fn update(&self, id: RoomId, patch: RoomPatch) -> Result<Room, BookingError> {
        validate_room_patch(&patch)?;
        let existing = self.rooms.get_by_id(id).await?;
        if patch.is_empty() {
            return Ok(existing);
        }
        if let Patch::Value(name) = &patch.name {
            self.ensure_name_free(name, Some(id)).await?;
        }

        let room = self.rooms.update(existing, patch).await?;
        tracing::info!(room_id = %room.id, name = %room.name, "meeting room updated");
        Ok(room)
    }

    /// Deletes a room and its reservations, returning the room as it was.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] for an unknown id.
    pub async fn delete(&self, id: RoomId) -> Result<Room, BookingError> {
        let existing = self.rooms.get_by_id(id).await?;
        let room = self.rooms.delete(existing).await?;
        tracing::info!(room_id = %room.id, "meeting room deleted");
        Ok(room)
    }

    /// Reservations of an existing room, ordered by start.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] for an unknown id.
    pub async fn reservations(&self, id: RoomId) -> Result<Vec<Reservation>, BookingError> {
        let room = self.rooms.get_by_id(id).await?;
        self.reservations.list_for_room(room.id).await
    }

    async fn ensure_name_free(&self, name: &str, owner: Option<RoomId>) -> Result<(), BookingError> {
        match self.rooms.get_id_by_name(name).await? {
            Some(taken_by) if Some(taken_by) != owner => {
                tracing::warn!(name, %taken_by, "room name already in use");
                Err(BookingError::DuplicateRoomName(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}
