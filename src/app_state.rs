//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::domain::{AccessPolicy, Clock};
use crate::persistence::{ReservationRepository, RoomRepository};
use crate::service::{ReservationService, RoomService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Room service for meeting room CRUD.
    pub rooms: Arc<RoomService>,
    /// Reservation service for overlap-safe booking.
    pub reservations: Arc<ReservationService>,
    /// Verifies bearer tokens.
    pub identity: Arc<dyn IdentityProvider>,
    /// Which callers may perform which operation classes.
    pub access: AccessPolicy,
}

impl AppState {
    /// Wires both services over one store.
    ///
    /// `store` is usually a [`crate::persistence::postgres::PostgresStore`]
    /// or a [`crate::persistence::memory::MemoryStore`].
    #[must_use]
    pub fn new<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        access: AccessPolicy,
    ) -> Self
    where
        S: RoomRepository + ReservationRepository + 'static,
    {
        let room_repo: Arc<dyn RoomRepository> = Arc::clone(&store) as Arc<dyn RoomRepository>;
        let reservation_repo: Arc<dyn ReservationRepository> = store;
        Self {
            rooms: Arc::new(RoomService::new(
                room_repo,
                Arc::clone(&reservation_repo),
            )),
            reservations: Arc::new(ReservationService::new(reservation_repo, clock)),
            identity,
            access,
        }
    }
}
