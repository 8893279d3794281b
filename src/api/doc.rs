//! OpenAPI document for the REST API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    ReservationCreateRequest, ReservationResponse, ReservationUpdateRequest, RoomCreateRequest,
    RoomResponse, RoomUpdateRequest,
};
use crate::api::handlers::system::HealthResponse;
use crate::error::{ErrorBody, ErrorResponse};
use crate::validation::FieldIssue;

/// Registers the bearer token scheme referenced by the guarded endpoints.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Token issued by the identity provider."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document covering every route of [`crate::api::build_router`].
#[derive(Debug, OpenApi)]
#[openapi(
    modifiers(&BearerAuth),
    info(
        title = "roombook",
        description = "Meeting room reservations with overlap-safe booking."
    ),
    paths(
        crate::api::handlers::meeting_rooms::create_room,
        crate::api::handlers::meeting_rooms::list_rooms,
        crate::api::handlers::meeting_rooms::get_room,
        crate::api::handlers::meeting_rooms::update_room,
        crate::api::handlers::meeting_rooms::delete_room,
        crate::api::handlers::meeting_rooms::list_room_reservations,
        crate::api::handlers::reservations::create_reservation,
        crate::api::handlers::reservations::list_reservations,
        crate::api::handlers::reservations::get_reservation,
        crate::api::handlers::reservations::update_reservation,
        crate::api::handlers::reservations::delete_reservation,
        crate::api::handlers::system::health_handler,
    ),
    components(schemas(
        RoomCreateRequest,
        RoomUpdateRequest,
        RoomResponse,
        ReservationCreateRequest,
        ReservationUpdateRequest,
        ReservationResponse,
        HealthResponse,
        ErrorResponse,
        ErrorBody,
        FieldIssue,
    )),
    tags(
        (name = "Meeting rooms", description = "Room CRUD"),
        (name = "Reservations", description = "Overlap-checked bookings"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/meeting_rooms",
            "/api/v1/meeting_rooms/{id}",
            "/api/v1/meeting_rooms/{id}/reservations",
            "/api/v1/reservations",
            "/api/v1/reservations/{id}",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let has_scheme = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer"));
        assert!(has_scheme);
    }
}
