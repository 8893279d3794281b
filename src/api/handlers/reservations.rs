//! Reservation handlers: create, list, get, update, delete.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::Instrument;

use crate::api::dto::{ReservationCreateRequest, ReservationResponse, ReservationUpdateRequest};
use crate::api::extract::{ApiJson, ApiPath, Authorized, CanReadReservations, CanWriteReservations};
use crate::app_state::AppState;
use crate::domain::ReservationId;
use crate::error::{BookingError, ErrorResponse};

/// `POST /reservations`: Book a room for an interval.
///
/// # Errors
///
/// Returns [`BookingError`] for an invalid interval, an unknown room or an
/// overlapping booking.
#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    summary = "Create a reservation",
    description = "Books `[from_reserve, to_reserve)` for the room. The start must be in the future and the interval must not intersect another booking of the same room; touching intervals are allowed.",
    request_body = ReservationCreateRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Interval already booked", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse),
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    auth: Authorized<CanWriteReservations>,
    ApiJson(req): ApiJson<ReservationCreateRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let reservation = state
        .reservations
        .create(req.into())
        .instrument(auth.span())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse::from(reservation)),
    ))
}

/// `GET /reservations`: List all reservations.
///
/// # Errors
///
/// Returns [`BookingError`] if the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "Reservations",
    summary = "List reservations",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All reservations ordered by start", body = Vec<ReservationResponse>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    _auth: Authorized<CanReadReservations>,
) -> Result<Json<Vec<ReservationResponse>>, BookingError> {
    let reservations = state.reservations.list().await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationResponse::from)
            .collect(),
    ))
}

/// `GET /reservations/{id}`: Get one reservation.
///
/// # Errors
///
/// Returns [`BookingError::ReservationNotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    summary = "Get a reservation",
    params(("id" = i32, Path, description = "Reservation identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reservation found", body = ReservationResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    _auth: Authorized<CanReadReservations>,
    ApiPath(id): ApiPath<ReservationId>,
) -> Result<Json<ReservationResponse>, BookingError> {
    let reservation = state.reservations.get(id).await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

/// `PATCH /reservations/{id}`: Move a reservation.
///
/// # Errors
///
/// Returns [`BookingError`] for an unknown id, an invalid merged interval
/// or an overlap with another booking.
#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    summary = "Update a reservation",
    description = "Omitted fields keep their stored value. A new start must lie in the future; the merged interval is checked against every other booking of the room.",
    params(("id" = i32, Path, description = "Reservation identifier")),
    request_body = ReservationUpdateRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reservation updated", body = ReservationResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 409, description = "Interval already booked", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse),
    )
)]
pub async fn update_reservation(
    State(state): State<AppState>,
    auth: Authorized<CanWriteReservations>,
    ApiPath(id): ApiPath<ReservationId>,
    ApiJson(req): ApiJson<ReservationUpdateRequest>,
) -> Result<Json<ReservationResponse>, BookingError> {
    let reservation = state
        .reservations
        .update(id, req.into())
        .instrument(auth.span())
        .await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

/// `DELETE /reservations/{id}`: Cancel a reservation.
///
/// # Errors
///
/// Returns [`BookingError::ReservationNotFound`] for an unknown id.
#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    summary = "Delete a reservation",
    params(("id" = i32, Path, description = "Reservation identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reservation deleted", body = ReservationResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
    )
)]
pub async fn delete_reservation(
    State(state): State<AppState>,
    auth: Authorized<CanWriteReservations>,
    ApiPath(id): ApiPath<ReservationId>,
) -> Result<Json<ReservationResponse>, BookingError> {
    let reservation = state
        .reservations
        .delete(id)
        .instrument(auth.span())
        .await?;
    Ok(Json(ReservationResponse::from(reservation)))
}

/// Reservation routes, relative to `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(get_reservation)
                .patch(update_reservation)
                .delete(delete_reservation),
        )
}
