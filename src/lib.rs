//! # roombook
//!
//! REST backend for meeting-room reservations.
//!
//! Rooms and reservations are stored in PostgreSQL (or an in-memory store
//! with the same semantics). The central rule is that no two reservations
//! of a room overlap: intervals are half-open, so a booking ending at 11:00
//! and one starting at 11:00 coexist. The check and the write happen in one
//! per-room critical section, so concurrent requests cannot double-book.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │     └── Caller extractor ── IdentityProvider (auth/) + AccessPolicy
//!     │
//!     ├── RoomService / ReservationService (service/)
//!     │     └── validation/ + Clock
//!     │
//!     ├── RoomRepository / ReservationRepository (persistence/)
//!     │
//!     └── PostgreSQL (sqlx) | MemoryStore
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod validation;
