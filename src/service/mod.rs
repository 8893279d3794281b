//! Service layer: business logic orchestration.
//!
//! [`RoomService`] and [`ReservationService`] run validation, consult the
//! repositories and log every mutation. They hold no state of their own
//! beyond shared handles, so cloning them is cheap.

pub mod reservation_service;
pub mod room_service;

pub use reservation_service::ReservationService;
pub use room_service::RoomService;
