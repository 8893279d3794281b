//! End-to-end tests: the real router over the in-memory store, served on an
//! ephemeral port and driven with `reqwest`.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use roombook::api;
use roombook::app_state::AppState;
use roombook::auth::StaticTokenProvider;
use roombook::domain::{AccessPolicy, FixedClock};
use roombook::persistence::memory::MemoryStore;

const ADMIN: &str = "admin-token";
const USER: &str = "user-token";

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Self {
        let Ok(identity) = StaticTokenProvider::parse("admin-token:1:admin,user-token:2") else {
            panic!("token table rejected");
        };
        let Some(now) =
            NaiveDate::from_ymd_opt(2030, 1, 1).and_then(|d| d.and_hms_opt(8, 0, 0))
        else {
            panic!("valid date");
        };
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock(now)),
            Arc::new(identity),
            AccessPolicy::default(),
        );
        let app = api::build_router().with_state(state);

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, format!("{}{path}", self.base));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let Ok(resp) = req.send().await else {
            panic!("request to {path} failed");
        };
        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn create_room(&self, name: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/meeting_rooms",
                Some(ADMIN),
                Some(json!({"name": name})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let Some(id) = body["id"].as_i64() else {
            panic!("room without id: {body}");
        };
        id
    }

    async fn book(&self, room: i64, from: &str, to: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/api/v1/reservations",
            Some(USER),
            Some(json!({
                "meetingroom_id": room,
                "from_reserve": format!("2030-01-01T{from}"),
                "to_reserve": format!("2030-01-01T{to}"),
            })),
        )
        .await
    }
}

fn error_code(body: &Value) -> Option<u64> {
    body["error"]["code"].as_u64()
}

#[tokio::test]
async fn health_needs_no_token() {
    let server = TestServer::spawn().await;
    let (status, body) = server.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["server_time"], "2030-01-01T08:00:00");
}

#[tokio::test]
async fn anonymous_and_unknown_callers_are_unauthorized() {
    let server = TestServer::spawn().await;

    let Ok(resp) = server
        .client
        .get(format!("{}/api/v1/meeting_rooms", server.base))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("www-authenticate"));

    let (status, body) = server
        .call(Method::GET, "/api/v1/reservations", Some("forged"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), Some(1101));
}

#[tokio::test]
async fn room_writes_need_superuser() {
    let server = TestServer::spawn().await;
    let (status, body) = server
        .call(
            Method::POST,
            "/api/v1/meeting_rooms",
            Some(USER),
            Some(json!({"name": "A101"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), Some(1102));

    let (status, _) = server
        .call(Method::GET, "/api/v1/meeting_rooms", Some(USER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn anonymous_bad_body_is_unauthorized_not_invalid() {
    let server = TestServer::spawn().await;
    let (status, _) = server
        .call(
            Method::POST,
            "/api/v1/reservations",
            None,
            Some(json!({"nonsense": true})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_scenario() {
    let server = TestServer::spawn().await;
    let room = server.create_room("A101").await;

    let (status, first) = server.book(room, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["meetingroom_id"], room);
    assert_eq!(first["from_reserve"], "2030-01-01T10:00:00");

    let (status, body) = server.book(room, "10:30", "10:45").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), Some(2102));

    let (status, _) = server.book(room, "11:00", "12:00").await;
    assert_eq!(status, StatusCode::CREATED);

    let Some(first_id) = first["id"].as_i64() else {
        panic!("reservation without id");
    };
    let (status, same) = server
        .call(
            Method::PATCH,
            &format!("/api/v1/reservations/{first_id}"),
            Some(USER),
            Some(json!({"from_reserve": "2030-01-01T10:00", "to_reserve": "2030-01-01T11:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{same}");
    assert_eq!(same, first);

    let (status, list) = server
        .call(
            Method::GET,
            &format!("/api/v1/meeting_rooms/{room}/reservations"),
            Some(USER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let Some(list) = list.as_array() else {
        panic!("expected a list");
    };
    let starts: Vec<&str> = list
        .iter()
        .filter_map(|r| r["from_reserve"].as_str())
        .collect();
    assert_eq!(starts, ["2030-01-01T10:00:00", "2030-01-01T11:00:00"]);
}

#[tokio::test]
async fn invalid_reservations_are_unprocessable() {
    let server = TestServer::spawn().await;
    let room = server.create_room("A101").await;

    let (status, body) = server.book(room, "11:00", "10:00").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), Some(1001));
    assert_eq!(body["error"]["details"][0]["field"], "from_reserve");

    let (status, _) = server.book(room, "07:00", "09:00").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = server
        .call(
            Method::POST,
            "/api/v1/reservations",
            Some(USER),
            Some(json!({
                "meetingroom_id": room,
                "from_reserve": "2030-01-01T10:00",
                "to_reserve": "2030-01-01T11:00",
                "user_id": 2,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn reservation_cannot_move_rooms() {
    let server = TestServer::spawn().await;
    let room = server.create_room("A101").await;
    let other = server.create_room("B201").await;
    let (_, booked) = server.book(room, "10:00", "11:00").await;
    let Some(id) = booked["id"].as_i64() else {
        panic!("reservation without id");
    };
    let (status, _) = server
        .call(
            Method::PATCH,
            &format!("/api/v1/reservations/{id}"),
            Some(USER),
            Some(json!({"meetingroom_id": other})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn booking_unknown_room_is_not_found() {
    let server = TestServer::spawn().await;
    let (status, body) = server.book(999, "10:00", "11:00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), Some(2001));
}

#[tokio::test]
async fn room_name_rules() {
    let server = TestServer::spawn().await;
    let room = server.create_room("A101").await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/v1/meeting_rooms",
            Some(ADMIN),
            Some(json!({"name": "A101"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), Some(2101));

    let (status, _) = server
        .call(
            Method::POST,
            "/api/v1/meeting_rooms",
            Some(ADMIN),
            Some(json!({"name": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = server
        .call(
            Method::PATCH,
            &format!("/api/v1/meeting_rooms/{room}"),
            Some(ADMIN),
            Some(json!({"name": null})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn room_patch_changes_only_given_fields() {
    let server = TestServer::spawn().await;
    let (_, created) = server
        .call(
            Method::POST,
            "/api/v1/meeting_rooms",
            Some(ADMIN),
            Some(json!({"name": "A101", "description": "projector"})),
        )
        .await;
    let Some(id) = created["id"].as_i64() else {
        panic!("room without id");
    };

    let (status, renamed) = server
        .call(
            Method::PATCH,
            &format!("/api/v1/meeting_rooms/{id}"),
            Some(ADMIN),
            Some(json!({"name": "A102"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["description"], "projector");

    let (status, cleared) = server
        .call(
            Method::PATCH,
            &format!("/api/v1/meeting_rooms/{id}"),
            Some(ADMIN),
            Some(json!({"description": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["name"], "A102");
    assert_eq!(cleared["description"], Value::Null);
}

#[tokio::test]
async fn deleting_a_room_removes_its_reservations() {
    let server = TestServer::spawn().await;
    let room = server.create_room("A101").await;
    let (_, booked) = server.book(room, "10:00", "11:00").await;
    let Some(reservation) = booked["id"].as_i64() else {
        panic!("reservation without id");
    };

    let (status, deleted) = server
        .call(
            Method::DELETE,
            &format!("/api/v1/meeting_rooms/{room}"),
            Some(ADMIN),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["name"], "A101");

    let (status, _) = server
        .call(
            Method::GET,
            &format!("/api/v1/reservations/{reservation}"),
            Some(USER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_unprocessable() {
    let server = TestServer::spawn().await;
    let (status, body) = server
        .call(Method::GET, "/api/v1/meeting_rooms/abc", Some(USER), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), Some(1001));
}

#[tokio::test]
async fn concurrent_identical_bookings_admit_one() {
    let server = Arc::new(TestServer::spawn().await);
    let room = server.create_room("A101").await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            server.book(room, "10:00", "11:00").await.0
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        let Ok(status) = handle.await else {
            panic!("booking task failed");
        };
        if status == StatusCode::CREATED {
            created += 1;
        } else if status == StatusCode::CONFLICT {
            conflicts += 1;
        } else {
            panic!("unexpected status {status}");
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 9);
}
