//! In-process store with the same semantics as the PostgreSQL schema.
//!
//! [`MemoryStore`] keeps both tables behind a single
//! [`tokio::sync::RwLock`]. Reads share the lock; every write holds the
//! write guard across its checks and its mutation, which makes the
//! overlap check and the insert one atomic step exactly like the advisory
//! lock does in PostgreSQL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ReservationRepository, RoomRepository};
use chrono::NaiveDateTime;

use crate::domain::{
    NewReservation, NewRoom, Reservation, ReservationId, ReservationPatch, Room, RoomId,
    RoomPatch, find_overlap,
};
use crate::error::BookingError;
use crate::validation::validate_reservation_update;

#[derive(Debug, Default)]
struct Tables {
    rooms: BTreeMap<RoomId, Room>,
    reservations: BTreeMap<ReservationId, Reservation>,
    last_room_id: i32,
    last_reservation_id: i32,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<RoomId>) -> bool {
        self.rooms
            .values()
            .any(|room| room.name == name && Some(room.id) != except)
    }

    fn room_reservations(&self, room_id: RoomId) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .values()
            .filter(move |r| r.room_id == room_id)
    }
}

/// Both repositories over in-memory tables.
///
/// Ids are assigned from per-table counters starting at 1, like `SERIAL`
/// columns. Deleting a room also deletes its reservations, matching the
/// `ON DELETE CASCADE` foreign key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Advances a `SERIAL`-style counter; running past `i32::MAX` is an error
/// rather than a reused id.
fn next_id(counter: &mut i32, table: &str) -> Result<i32, BookingError> {
    let next = counter
        .checked_add(1)
        .ok_or_else(|| BookingError::Internal(format!("{table} id sequence exhausted")))?;
    *counter = next;
    Ok(next)
}

fn sorted_by_start(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    reservations.sort_by_key(|r| (r.from_time, r.id));
    reservations
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn create(&self, room: NewRoom) -> Result<Room, BookingError> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&room.name, None) {
            return Err(BookingError::DuplicateRoomName(room.name));
        }
        let id = next_id(&mut tables.last_room_id, "meetingroom")?;
        let stored = Room {
            id: RoomId::new(id),
            name: room.name,
            description: room.description,
        };
        tables.rooms.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: RoomId) -> Result<Room, BookingError> {
        let tables = self.tables.read().await;
        tables
            .rooms
            .get(&id)
            .cloned()
            .ok_or(BookingError::RoomNotFound(id))
    }

    async fn get_id_by_name(&self, name: &str) -> Result<Option<RoomId>, BookingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rooms
            .values()
            .find(|room| room.name == name)
            .map(|room| room.id))
    }

    async fn list_all(&self) -> Result<Vec<Room>, BookingError> {
        let tables = self.tables.read().await;
        Ok(tables.rooms.values().cloned().collect())
    }

    async fn update(&self, existing: Room, patch: RoomPatch) -> Result<Room, BookingError> {
        let mut tables = self.tables.write().await;
        let id = existing.id;
        let current = tables
            .rooms
            .get(&id)
            .cloned()
            .ok_or(BookingError::RoomNotFound(id))?;
        let updated = current.patched(patch);
        if tables.name_taken(&updated.name, Some(id)) {
            return Err(BookingError::DuplicateRoomName(updated.name));
        }
        tables.rooms.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, existing: Room) -> Result<Room, BookingError> {
        let mut tables = self.tables.write().await;
        tables
            .rooms
            .remove(&existing.id)
            .ok_or(BookingError::RoomNotFound(existing.id))?;
        tables.reservations.retain(|_, r| r.room_id != existing.id);
        Ok(existing)
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create(&self, reservation: NewReservation) -> Result<Reservation, BookingError> {
        let mut tables = self.tables.write().await;
        let NewReservation { room_id, slot } = reservation;
        if !tables.rooms.contains_key(&room_id) {
            return Err(BookingError::RoomNotFound(room_id));
        }
        if let Some(conflict) = find_overlap(room_id, slot, None, tables.room_reservations(room_id))
        {
            return Err(BookingError::Overlap {
                room_id,
                conflicting: conflict.id,
            });
        }
        let id = next_id(&mut tables.last_reservation_id, "reservation")?;
        let stored = Reservation {
            id: ReservationId::new(id),
            room_id,
            from_time: slot.from,
            to_time: slot.to,
        };
        tables.reservations.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<Reservation>, BookingError> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables.room_reservations(room_id).cloned().collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, BookingError> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables.reservations.values().cloned().collect(),
        ))
    }

    async fn get_by_id(&self, id: ReservationId) -> Result<Reservation, BookingError> {
        let tables = self.tables.read().await;
        tables
            .reservations
            .get(&id)
            .cloned()
            .ok_or(BookingError::ReservationNotFound(id))
    }

    async fn update(
        &self,
        existing: Reservation,
        patch: ReservationPatch,
        now: NaiveDateTime,
    ) -> Result<Reservation, BookingError> {
        let mut tables = self.tables.write().await;
        let current = tables
            .reservations
            .get(&existing.id)
            .cloned()
            .ok_or(BookingError::ReservationNotFound(existing.id))?;
        let slot = validate_reservation_update(&current, &patch, now)?;
        let room_id = current.room_id;
        if let Some(conflict) = find_overlap(
            room_id,
            slot,
            Some(current.id),
            tables.room_reservations(room_id),
        ) {
            return Err(BookingError::Overlap {
                room_id,
                conflicting: conflict.id,
            });
        }
        let updated = Reservation {
            from_time: slot.from,
            to_time: slot.to,
            ..current
        };
        tables.reservations.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, existing: Reservation) -> Result<Reservation, BookingError> {
        let mut tables = self.tables.write().await;
        tables
            .reservations
            .remove(&existing.id)
            .ok_or(BookingError::ReservationNotFound(existing.id))?;
        Ok(existing)
    }
}
