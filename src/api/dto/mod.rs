//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names follow the published wire format (`meetingroom_id`,
//! `from_reserve`, `to_reserve`). Timestamps carry no offset.

pub mod naive_time;
pub mod reservation_dto;
pub mod room_dto;

pub use reservation_dto::*;
pub use room_dto::*;
