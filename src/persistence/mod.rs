//! Persistence layer: repository traits and their store implementations.
//!
//! [`RoomRepository`] and [`ReservationRepository`] are the seams the
//! services depend on. [`postgres::PostgresStore`] is the production
//! implementation backed by `sqlx::PgPool`; [`memory::MemoryStore`] keeps
//! the same semantics in process for local runs and tests.
//!
//! Reservation writes are atomic per room: the overlap query and the
//! insert/update run under one per-room exclusion scope, so two concurrent
//! writers can never both pass the check for intersecting intervals.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::{
    NewReservation, NewRoom, Reservation, ReservationId, ReservationPatch, Room, RoomId, RoomPatch,
};
use crate::error::BookingError;

/// CRUD over meeting rooms.
#[async_trait]
pub trait RoomRepository: Send + Sync + Debug {
    /// Inserts a room and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// [`BookingError::DuplicateRoomName`] if the name is taken.
    async fn create(&self, room: NewRoom) -> Result<Room, BookingError>;

    /// Fetches one room.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] if no such room exists.
    async fn get_by_id(&self, id: RoomId) -> Result<Room, BookingError>;

    /// Looks up the id of the room with exactly this name.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn get_id_by_name(&self, name: &str) -> Result<Option<RoomId>, BookingError>;

    /// Returns every room.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn list_all(&self) -> Result<Vec<Room>, BookingError>;

    /// Applies a validated patch over the currently stored row and returns
    /// the result.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] if the room vanished,
    /// [`BookingError::DuplicateRoomName`] if the new name is taken.
    async fn update(&self, existing: Room, patch: RoomPatch) -> Result<Room, BookingError>;

    /// Deletes a room together with its reservations and returns the room
    /// as it was immediately before deletion.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] if the room vanished.
    async fn delete(&self, existing: Room) -> Result<Room, BookingError>;
}

/// CRUD over reservations, including the overlap query.
#[async_trait]
pub trait ReservationRepository: Send + Sync + Debug {
    /// Atomically checks the room exists, runs the overlap query and
    /// inserts.
    ///
    /// # Errors
    ///
    /// [`BookingError::RoomNotFound`] for a dangling room id,
    /// [`BookingError::Overlap`] if the interval is taken.
    async fn create(&self, reservation: NewReservation) -> Result<Reservation, BookingError>;

    /// Reservations of one room ordered by start.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<Reservation>, BookingError>;

    /// Every reservation ordered by start.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn list_all(&self) -> Result<Vec<Reservation>, BookingError>;

    /// Fetches one reservation.
    ///
    /// # Errors
    ///
    /// [`BookingError::ReservationNotFound`] if no such reservation exists.
    async fn get_by_id(&self, id: ReservationId) -> Result<Reservation, BookingError>;

    /// Reschedules `existing` inside the room's exclusion scope.
    ///
    /// The stored row is re-read under the lock and the patch is merged
    /// over it, so concurrent patches touching different fields all land.
    /// The merged interval goes through
    /// [`crate::validation::validate_reservation_update`] against `now` and
    /// is then checked for overlap with every other reservation of the room.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] for an invalid merged interval,
    /// [`BookingError::Overlap`] if the new interval is taken,
    /// [`BookingError::ReservationNotFound`] if the reservation vanished.
    async fn update(
        &self,
        existing: Reservation,
        patch: ReservationPatch,
        now: NaiveDateTime,
    ) -> Result<Reservation, BookingError>;

    /// Removes a reservation and returns it as it was.
    ///
    /// # Errors
    ///
    /// [`BookingError::ReservationNotFound`] if the reservation vanished.
    async fn delete(&self, existing: Reservation) -> Result<Reservation, BookingError>;
}
