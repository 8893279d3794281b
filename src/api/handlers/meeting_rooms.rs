//! Meeting room handlers: create, list, get, update, delete, and the
//! reservations of one room.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::Instrument;

use crate::api::dto::{ReservationResponse, RoomCreateRequest, RoomResponse, RoomUpdateRequest};
use crate::api::extract::{ApiJson, ApiPath, Authorized, CanReadReservations, CanReadRooms, CanWriteRooms};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{BookingError, ErrorResponse};

/// `POST /meeting_rooms`: Create a meeting room.
///
/// # Errors
///
/// Returns [`BookingError`] on an invalid or duplicate name.
#[utoipa::path(
    post,
    path = "/api/v1/meeting_rooms",
    tag = "Meeting rooms",
    summary = "Create a meeting room",
    description = "Creates a room. The name must be unique and 1 to 100 characters long.",
    request_body = RoomCreateRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
        (status = 403, description = "Caller is not a superuser", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse),
    )
)]
pub async fn create_room(
    State(state): State<AppState>,
    auth: Authorized<CanWriteRooms>,
    ApiJson(req): ApiJson<RoomCreateRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let room = state.rooms.create(req.into()).instrument(auth.span()).await?;
    Ok((StatusCode::CREATED, Json(RoomResponse::from(room))))
}

/// `GET /meeting_rooms`: List all meeting rooms.
///
/// # Errors
///
/// Returns [`BookingError`] if the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/meeting_rooms",
    tag = "Meeting rooms",
    summary = "List meeting rooms",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All rooms", body = Vec<RoomResponse>),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    _auth: Authorized<CanReadRooms>,
) -> Result<Json<Vec<RoomResponse>>, BookingError> {
    let rooms = state.rooms.list().await?;
    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// `GET /meeting_rooms/{id}`: Get one meeting room.
///
/// # Errors
///
/// Returns [`BookingError::RoomNotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/v1/meeting_rooms/{id}",
    tag = "Meeting rooms",
    summary = "Get a meeting room",
    params(("id" = i32, Path, description = "Room identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Room found", body = RoomResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    _auth: Authorized<CanReadRooms>,
    ApiPath(id): ApiPath<RoomId>,
) -> Result<Json<RoomResponse>, BookingError> {
    let room = state.rooms.get(id).await?;
    Ok(Json(RoomResponse::from(room)))
}

/// `PATCH /meeting_rooms/{id}`: Partially update a meeting room.
///
/// # Errors
///
/// Returns [`BookingError`] for an unknown id, an invalid or null name, or
/// a name used by another room.
#[utoipa::path(
    patch,
    path = "/api/v1/meeting_rooms/{id}",
    tag = "Meeting rooms",
    summary = "Update a meeting room",
    description = "Changes only the fields present in the body. `description: null` clears the description.",
    params(("id" = i32, Path, description = "Room identifier")),
    request_body = RoomUpdateRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Room updated", body = RoomResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse),
    )
)]
pub async fn update_room(
    State(state): State<AppState>,
    auth: Authorized<CanWriteRooms>,
    ApiPath(id): ApiPath<RoomId>,
    ApiJson(req): ApiJson<RoomUpdateRequest>,
) -> Result<Json<RoomResponse>, BookingError> {
    let room = state
        .rooms
        .update(id, req.into())
        .instrument(auth.span())
        .await?;
    Ok(Json(RoomResponse::from(room)))
}

/// `DELETE /meeting_rooms/{id}`: Delete a meeting room and its
/// reservations.
///
/// # Errors
///
/// Returns [`BookingError::RoomNotFound`] for an unknown id.
#[utoipa::path(
    delete,
    path = "/api/v1/meeting_rooms/{id}",
    tag = "Meeting rooms",
    summary = "Delete a meeting room",
    description = "Deletes the room together with its reservations and returns the room as it was.",
    params(("id" = i32, Path, description = "Room identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Room deleted", body = RoomResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn delete_room(
    State(state): State<AppState>,
    auth: Authorized<CanWriteRooms>,
    ApiPath(id): ApiPath<RoomId>,
) -> Result<Json<RoomResponse>, BookingError> {
    let room = state.rooms.delete(id).instrument(auth.span()).await?;
    Ok(Json(RoomResponse::from(room)))
}

/// `GET /meeting_rooms/{id}/reservations`: Reservations of one room.
///
/// # Errors
///
/// Returns [`BookingError::RoomNotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/v1/meeting_rooms/{id}/reservations",
    tag = "Meeting rooms",
    summary = "List reservations of a meeting room",
    params(("id" = i32, Path, description = "Room identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reservations ordered by start", body = Vec<ReservationResponse>),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn list_room_reservations(
    State(state): State<AppState>,
    _auth: Authorized<CanReadReservations>,
    ApiPath(id): ApiPath<RoomId>,
) -> Result<Json<Vec<ReservationResponse>>, BookingError> {
    let reservations = state.rooms.reservations(id).await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationResponse::from)
            .collect(),
    ))
}

/// Meeting room routes, relative to `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meeting_rooms", get(list_rooms).post(create_room))
        .route(
            "/meeting_rooms/{id}",
            get(get_room).patch(update_room).delete(delete_room),
        )
        .route(
            "/meeting_rooms/{id}/reservations",
            get(list_room_reservations),
        )
}
