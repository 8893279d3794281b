//! Request extractors shared by the handlers.

use std::marker::PhantomData;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::app_state::AppState;
use crate::domain::{Identity, Operation};
use crate::error::BookingError;
use crate::validation::ValidationErrors;

/// The caller behind a request, if it presented credentials.
///
/// A missing `Authorization` header yields `Caller(None)`. A header that is
/// present but malformed or carries an unknown token is rejected with 401
/// straight away.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Identity>);

impl FromRequestParts<AppState> for Caller {
    type Rejection = BookingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or(BookingError::Unauthorized)?;
        let identity = state.identity.authenticate(token).await?;
        Ok(Self(Some(identity)))
    }
}

/// Marks an operation class a handler is guarded by.
pub trait Guarded {
    /// The class checked against [`crate::domain::AccessPolicy`].
    const OPERATION: Operation;
}

/// Guard for listing and fetching rooms.
#[derive(Debug, Clone, Copy)]
pub struct CanReadRooms;

/// Guard for creating, updating and deleting rooms.
#[derive(Debug, Clone, Copy)]
pub struct CanWriteRooms;

/// Guard for listing and fetching reservations.
#[derive(Debug, Clone, Copy)]
pub struct CanReadReservations;

/// Guard for creating, updating and deleting reservations.
#[derive(Debug, Clone, Copy)]
pub struct CanWriteReservations;

impl Guarded for CanReadRooms {
    const OPERATION: Operation = Operation::RoomRead;
}

impl Guarded for CanWriteRooms {
    const OPERATION: Operation = Operation::RoomWrite;
}

impl Guarded for CanReadReservations {
    const OPERATION: Operation = Operation::ReservationRead;
}

impl Guarded for CanWriteReservations {
    const OPERATION: Operation = Operation::ReservationWrite;
}

/// A caller that passed the access policy for `G`.
///
/// Runs before any body extractor, so an anonymous request with a bad
/// body is answered with 401 rather than 422.
#[derive(Debug, Clone)]
pub struct Authorized<G> {
    /// The verified caller; `None` only for public operations.
    pub identity: Option<Identity>,
    guard: PhantomData<G>,
}

impl<G> Authorized<G> {
    /// Span carrying the caller's user id, for instrumenting service calls.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "caller",
            user_id = self.identity.as_ref().map(|i| i.user_id)
        )
    }
}

impl<G> FromRequestParts<AppState> for Authorized<G>
where
    G: Guarded + Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Caller(identity) = Caller::from_request_parts(parts, state).await?;
        state.access.authorize(G::OPERATION, identity.as_ref())?;
        Ok(Self {
            identity,
            guard: PhantomData,
        })
    }
}

/// Extracts the token from `Bearer <token>`; the scheme is matched
/// case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// JSON body extractor whose rejections use the service error format.
///
/// Syntax errors, unknown fields and wrong types all become
/// [`BookingError::Validation`] with a single `body` issue.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_error(&rejection)),
        }
    }
}

fn body_error(rejection: &JsonRejection) -> BookingError {
    let mut errors = ValidationErrors::new();
    errors.push("body", rejection.body_text());
    BookingError::Validation(errors)
}

/// Path parameter extractor; a non-numeric id is a validation failure
/// rather than axum's plain-text 400.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_error(&rejection)),
        }
    }
}

fn path_error(rejection: &PathRejection) -> BookingError {
    let mut errors = ValidationErrors::new();
    errors.push("id", rejection.body_text());
    BookingError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_parsed() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer  "), None);
    }
}
