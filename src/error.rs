//! Service error type with HTTP status code mapping.
//!
//! [`BookingError`] is the single error type returned by validation,
//! services and repositories. Each variant maps to an HTTP status and a
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ReservationId, RoomId};
use crate::validation::{FieldIssue, ValidationErrors};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "validation failed: from_reserve: must be earlier than to_reserve",
///     "details": [{"field": "from_reserve", "message": "must be earlier than to_reserve"}]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the table on [`BookingError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Per-field issues for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldIssue>>,
}

/// Error enum shared by every layer of the service.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                  |
/// |-----------|--------------------|------------------------------|
/// | 1000–1099 | Validation         | 422 Unprocessable Entity     |
/// | 1100–1199 | Authentication     | 401 Unauthorized / 403       |
/// | 2000–2099 | Not Found          | 404 Not Found                |
/// | 2100–2199 | Conflict           | 409 Conflict                 |
/// | 3000–3999 | Server / Store     | 500 / 503                    |
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Input was malformed, incomplete or contradictory.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Referenced room does not exist.
    #[error("meeting room not found: {0}")]
    RoomNotFound(RoomId),

    /// Referenced reservation does not exist.
    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// Another room already uses this name.
    #[error("meeting room named `{0}` already exists")]
    DuplicateRoomName(String),

    /// The requested interval intersects an existing reservation.
    #[error("room {room_id} is already reserved by reservation {conflicting} in that interval")]
    Overlap {
        /// Room being booked.
        room_id: RoomId,
        /// First existing reservation found in the way.
        conflicting: ReservationId,
    },

    /// Credentials are missing or were rejected.
    #[error("authentication required")]
    Unauthorized,

    /// The caller is authenticated but not allowed to do this.
    #[error("operation requires superuser rights")]
    Forbidden,

    /// The store could not be reached in time; safe for the caller to retry.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Unauthorized => 1101,
            Self::Forbidden => 1102,
            Self::RoomNotFound(_) => 2001,
            Self::ReservationNotFound(_) => 2002,
            Self::DuplicateRoomName(_) => 2101,
            Self::Overlap { .. } => 2102,
            Self::Internal(_) => 3000,
            Self::StoreUnavailable(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RoomNotFound(_) | Self::ReservationNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateRoomName(_) | Self::Overlap { .. } => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for BookingError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let code = self.error_code();
        let message = self.to_string();
        let details = match self {
            Self::Validation(errors) => Some(errors.into_issues()),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
