//! Reservation service: time validation and overlap-safe booking.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::domain::{Clock, NewReservation, Reservation, ReservationId, ReservationPatch};
use crate::error::BookingError;
use crate::persistence::ReservationRepository;
use crate::validation::validate_new_reservation;

/// Orchestration layer for reservations.
///
/// The overlap check itself lives in the repository, where it runs inside
/// the same per-room critical section as the write. This service supplies
/// "now" from its [`Clock`] and reports rejected bookings.
#[derive(Debug, Clone)]
pub struct ReservationService {
    reservations: Arc<dyn ReservationRepository>,
    clock: Arc<dyn Clock>,
}

impl ReservationService {
    /// Creates a new `ReservationService`.
    #[must_use]
    pub fn new(reservations: Arc<dyn ReservationRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reservations,
            clock,
        }
    }

    /// The instant "starts in the future" is checked against.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Validates and books a new reservation.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] for a past start or an inverted
    /// interval, [`BookingError::RoomNotFound`] for an unknown room,
    /// [`BookingError::Overlap`] if the room is taken.
    pub async fn create(&self, reservation: NewReservation) -> Result<Reservation, BookingError> {
        validate_new_reservation(&reservation, self.clock.now())?;
        let room_id = reservation.room_id;

        let reservation = self
            .reservations
            .create(reservation)
            .await
            .inspect_err(|e| log_rejection(e, "reservation rejected"))?;
        tracing::info!(
            reservation_id = %reservation.id,
            %room_id,
            from = %reservation.from_time,
            to = %reservation.to_time,
            "reservation created"
        );
        Ok(reservation)
    }

    /// Fetches one reservation.
    ///
    /// # Errors
    ///
    /// [`BookingError::ReservationNotFound`] if it does not exist.
    pub async fn get(&self, id: ReservationId) -> Result<Reservation, BookingError> {
        self.reservations.get_by_id(id).await
    }

    /// Lists every reservation ordered by start.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn list(&self) -> Result<Vec<Reservation>, BookingError> {
        self.reservations.list_all().await
    }

    /// Moves a reservation. Absent fields keep their stored value. The
    /// repository merges the patch over the row it holds locked, so the
    /// interval validated and overlap-checked is the one written.
    ///
    /// # Errors
    ///
    /// [`BookingError::ReservationNotFound`] for an unknown id,
    /// [`BookingError::Validation`] for null fields, a past new start or an
    /// inverted merged interval, [`BookingError::Overlap`] on conflict.
    pub async fn update(
        &self,
        id: ReservationId,
        patch: ReservationPatch,
    ) -> Result<Reservation, BookingError> {
        let existing = self.reservations.get_by_id(id).await?;

        let reservation = self
            .reservations
            .update(existing, patch, self.clock.now())
            .await
            .inspect_err(|e| log_rejection(e, "reservation change rejected"))?;
        tracing::info!(
            reservation_id = %reservation.id,
            room_id = %reservation.room_id,
            from = %reservation.from_time,
            to = %reservation.to_time,
            "reservation updated"
        );
        Ok(reservation)
    }

    /// Cancels a reservation and returns it as it was.
    ///
    /// # Errors
    ///
    /// [`BookingError::ReservationNotFound`] for an unknown id.
    pub async fn delete(&self, id: ReservationId) -> Result<Reservation, BookingError> {
        let existing = self.reservations.get_by_id(id).await?;
        let reservation = self.reservations.delete(existing).await?;
        tracing::info!(reservation_id = %reservation.id, room_id = %reservation.room_id, "reservation deleted");
        Ok(reservation)
    }
}

fn log_rejection(err: &BookingError, message: &'static str) {
    if let BookingError::Overlap {
        room_id,
        conflicting,
    } = err
    {
        tracing::warn!(%room_id, %conflicting, "{message}");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{FixedClock, NewRoom, Patch, RoomId, TimeSlot};
    use crate::persistence::RoomRepository;
    use crate::persistence::memory::MemoryStore;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap_or_default()
    }

    async fn make_service() -> (ReservationService, RoomId) {
        let store = Arc::new(MemoryStore::new());
        let Ok(room) = RoomRepository::create(
            store.as_ref(),
            NewRoom {
                name: "A101".to_string(),
                description: None,
            },
        )
        .await
        else {
            panic!("room creation failed");
        };
        let clock = Arc::new(FixedClock(at(8, 0)));
        (ReservationService::new(store, clock), room.id)
    }

    fn booking(room_id: RoomId, from: (u32, u32), to: (u32, u32)) -> NewReservation {
        NewReservation {
            room_id,
            slot: TimeSlot::new(at(from.0, from.1), at(to.0, to.1)),
        }
    }

    #[tokio::test]
    async fn booking_scenario_on_one_room() {
        let (service, room) = make_service().await;

        let Ok(first) = service.create(booking(room, (10, 0), (11, 0))).await else {
            panic!("first booking rejected");
        };
        let inner = service.create(booking(room, (10, 30), (10, 45))).await;
        assert!(matches!(
            inner,
            Err(BookingError::Overlap { conflicting, .. }) if conflicting == first.id
        ));
        assert!(service.create(booking(room, (11, 0), (12, 0))).await.is_ok());

        let unchanged = service
            .update(
                first.id,
                ReservationPatch {
                    from_time: Patch::Value(at(10, 0)),
                    to_time: Patch::Value(at(11, 0)),
                },
            )
            .await;
        assert!(matches!(unchanged, Ok(r) if r == first));
    }

    #[tokio::test]
    async fn start_in_the_past_is_rejected() {
        let (service, room) = make_service().await;
        let result = service.create(booking(room, (7, 0), (9, 0))).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let (service, _) = make_service().await;
        let result = service.create(booking(RoomId::new(42), (10, 0), (11, 0))).await;
        assert!(matches!(result, Err(BookingError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn end_only_update_skips_future_check() {
        let store = Arc::new(MemoryStore::new());
        let Ok(room) = RoomRepository::create(
            store.as_ref(),
            NewRoom {
                name: "A101".to_string(),
                description: None,
            },
        )
        .await
        else {
            panic!("room creation failed");
        };
        let Ok(started) = ReservationRepository::create(
            store.as_ref(),
            booking(room.id, (9, 0), (10, 0)),
        )
        .await
        else {
            panic!("booking failed");
        };

        // The clock is past the stored start; extending the end is still allowed.
        let service = ReservationService::new(store, Arc::new(FixedClock(at(9, 30))));
        let patch = ReservationPatch {
            from_time: Patch::Absent,
            to_time: Patch::Value(at(10, 30)),
        };
        let Ok(extended) = service.update(started.id, patch).await else {
            panic!("end-only update rejected");
        };
        assert_eq!(extended.from_time, at(9, 0));
        assert_eq!(extended.to_time, at(10, 30));
    }

    #[tokio::test]
    async fn started_reservation_accepts_its_own_interval() {
        let store = Arc::new(MemoryStore::new());
        let Ok(room) = RoomRepository::create(
            store.as_ref(),
            NewRoom {
                name: "A101".to_string(),
                description: None,
            },
        )
        .await
        else {
            panic!("room creation failed");
        };
        let Ok(started) = ReservationRepository::create(
            store.as_ref(),
            booking(room.id, (9, 0), (10, 0)),
        )
        .await
        else {
            panic!("booking failed");
        };

        let service = ReservationService::new(store, Arc::new(FixedClock(at(9, 30))));
        let same = ReservationPatch {
            from_time: Patch::Value(at(9, 0)),
            to_time: Patch::Value(at(10, 0)),
        };
        let result = service.update(started.id, same).await;
        assert!(matches!(result, Ok(r) if r == started));

        let earlier = ReservationPatch {
            from_time: Patch::Value(at(8, 45)),
            to_time: Patch::Absent,
        };
        assert!(matches!(
            service.update(started.id, earlier).await,
            Err(BookingError::Validation(_))
        ));
    }

    /// Delays every point read so that concurrent updates see the same
    /// snapshot before reaching the store.
    #[derive(Debug)]
    struct SlowReads(MemoryStore);

    #[async_trait::async_trait]
    impl ReservationRepository for SlowReads {
        async fn create(&self, r: NewReservation) -> Result<Reservation, BookingError> {
            ReservationRepository::create(&self.0, r).await
        }

        async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<Reservation>, BookingError> {
            self.0.list_for_room(room_id).await
        }

        async fn list_all(&self) -> Result<Vec<Reservation>, BookingError> {
            ReservationRepository::list_all(&self.0).await
        }

        async fn get_by_id(&self, id: ReservationId) -> Result<Reservation, BookingError> {
            let found = ReservationRepository::get_by_id(&self.0, id).await;
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            found
        }

        async fn update(
            &self,
            existing: Reservation,
            patch: ReservationPatch,
            now: NaiveDateTime,
        ) -> Result<Reservation, BookingError> {
            ReservationRepository::update(&self.0, existing, patch, now).await
        }

        async fn delete(&self, existing: Reservation) -> Result<Reservation, BookingError> {
            ReservationRepository::delete(&self.0, existing).await
        }
    }

    #[tokio::test]
    async fn concurrent_updates_of_different_fields_both_land() {
        let store = MemoryStore::new();
        let Ok(room) = RoomRepository::create(
            &store,
            NewRoom {
                name: "A101".to_string(),
                description: None,
            },
        )
        .await
        else {
            panic!("room creation failed");
        };
        let Ok(r) = ReservationRepository::create(&store, booking(room.id, (10, 0), (11, 0))).await
        else {
            panic!("booking failed");
        };
        let service = ReservationService::new(
            Arc::new(SlowReads(store)),
            Arc::new(FixedClock(at(8, 0))),
        );

        let extend = ReservationPatch {
            from_time: Patch::Absent,
            to_time: Patch::Value(at(12, 0)),
        };
        let shift = ReservationPatch {
            from_time: Patch::Value(at(10, 30)),
            to_time: Patch::Absent,
        };
        let (a, b) = tokio::join!(service.update(r.id, extend), service.update(r.id, shift));
        assert!(a.is_ok());
        assert!(b.is_ok());

        let Ok(stored) = service.get(r.id).await else {
            panic!("reservation vanished");
        };
        assert_eq!(stored.from_time, at(10, 30));
        assert_eq!(stored.to_time, at(12, 0));
    }

    #[tokio::test]
    async fn update_cannot_invert_interval() {
        let (service, room) = make_service().await;
        let Ok(r) = service.create(booking(room, (10, 0), (11, 0))).await else {
            panic!("booking rejected");
        };
        let patch = ReservationPatch {
            from_time: Patch::Absent,
            to_time: Patch::Value(at(9, 30)),
        };
        let result = service.update(r.id, patch).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (service, room) = make_service().await;
        let Ok(r) = service.create(booking(room, (10, 0), (11, 0))).await else {
            panic!("booking rejected");
        };
        let Ok(deleted) = service.delete(r.id).await else {
            panic!("delete failed");
        };
        assert_eq!(deleted, r);
        assert!(matches!(
            service.get(r.id).await,
            Err(BookingError::ReservationNotFound(_))
        ));
        assert!(matches!(
            service.delete(r.id).await,
            Err(BookingError::ReservationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn freed_slot_can_be_rebooked() {
        let (service, room) = make_service().await;
        let Ok(r) = service.create(booking(room, (10, 0), (11, 0))).await else {
            panic!("booking rejected");
        };
        assert!(service.delete(r.id).await.is_ok());
        assert!(service.create(booking(room, (10, 0), (11, 0))).await.is_ok());
    }
}
