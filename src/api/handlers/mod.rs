//! REST endpoint handlers organized by resource.

pub mod meeting_rooms;
pub mod reservations;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(meeting_rooms::routes())
        .merge(reservations::routes())
}
