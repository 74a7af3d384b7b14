mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use common::{database, register, RecordingProvider};
use http_body_util::BodyExt;
use mentor_bookings::{
    api::{self, AppState, Caller},
    directory::UserDirectory,
    entity::user,
    BookingError, MemorySink, Notifier, Provisioner, Role,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

async fn login(session: Session, Json(caller): Json<Caller>) -> Result<StatusCode, BookingError> {
    api::sign_in(&session, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout(session: Session) -> Result<StatusCode, BookingError> {
    api::sign_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

struct TestApp {
    router: Router,
    mentee: user::Model,
    other_mentee: user::Model,
    mentor: user::Model,
    unapproved: user::Model,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_provider(RecordingProvider::default()).await
    }

    async fn with_provider(provider: RecordingProvider) -> Self {
        let db = database().await;
        let directory = UserDirectory::new(db.clone());
        let mentee = register(&directory, "Ada Lovelace", "ada@example.com", Role::Mentee, false).await;
        let other_mentee = register(&directory, "Mary Somerville", "mary@example.com", Role::Mentee, false).await;
        let mentor = register(&directory, "Alan Turing", "alan@uni.edu", Role::Mentor, true).await;
        let unapproved = register(&directory, "Edsger Dijkstra", "edsger@uni.edu", Role::Mentor, false).await;

        let state = AppState::new(
            db,
            Provisioner::new(Arc::new(provider)),
            Notifier::new(Arc::new(MemorySink::new())),
        );
        let router = Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .merge(api::routes())
            .with_state(state)
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false));

        Self {
            router,
            mentee,
            other_mentee,
            mentor,
            unapproved,
        }
    }

    /// Signs `user` in and returns the session cookie.
    async fn cookie_for(&self, user: &user::Model) -> String {
        let caller = Caller {
            user_id: user.id,
            role: user.role,
        };
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&caller).unwrap()))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login should set a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn call(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn booking_body(mentor: &user::Model, start: &str, topic: &str) -> Value {
    json!({ "mentorId": mentor.id, "startTime": start, "topic": topic })
}

#[tokio::test]
async fn booking_flow_over_http() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    let (status, created) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.mentor, "2025-06-01T14:00:00Z", "Essay review")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["topic"], "Essay review");
    assert_eq!(created["mentor"]["name"], "Alan Turing");
    assert_eq!(created["mentee"]["email"], "ada@example.com");
    assert!(created.get("meetingLink").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, confirmed) = app
        .call(Method::POST, &format!("/bookings/{id}/confirm"), Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["meetingCreated"], true);
    assert_eq!(confirmed["session"]["status"], "confirmed");
    assert!(confirmed["session"]["meetingLink"].is_string());

    let other = app.cookie_for(&app.other_mentee).await;
    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&other),
            Some(booking_body(&app.mentor, "2025-06-01T14:30:00Z", "Interview prep")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Time slot already booked or pending");

    let (status, body) = app
        .call(Method::DELETE, &format!("/bookings/{id}/cancel"), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session cancelled successfully");
    assert_eq!(body["session"]["status"], "cancelled");
    assert!(body["session"].get("meetingLink").is_none());
}

#[tokio::test]
async fn requests_without_a_signed_in_caller_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/bookings/my", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn signed_out_session_is_no_longer_accepted() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;

    let (status, _) = app.call(Method::GET, "/bookings/my", Some(&mentee), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call(Method::POST, "/logout", Some(&mentee), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.call(Method::GET, "/bookings/my", Some(&mentee), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_validates_shape_and_role() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(json!({ "mentorId": app.mentor.id, "topic": "No time" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: mentorId, startTime, or topic");

    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.mentor, "next tuesday", "Bad date")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid date format for startTime");

    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(json!({ "mentorId": "not-a-uuid", "startTime": "2025-06-01T14:00:00Z", "topic": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid mentorId");

    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.unapproved, "2025-06-01T14:00:00Z", "Unapproved")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or unapproved mentor");

    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(json!({ "mentorId": uuid::Uuid::new_v4(), "startTime": "2025-06-01T14:00:00Z", "topic": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Mentor not found");

    let (status, _) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentor),
            Some(booking_body(&app.mentor, "2025-06-01T14:00:00Z", "Self booking")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mentor_actions_are_gated() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    let (_, created) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.mentor, "2025-06-02T09:00:00Z", "Gatekeeping")),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(Method::POST, &format!("/bookings/{id}/confirm"), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (status, body) = app
        .call(Method::POST, &format!("/bookings/{id}/reject"), Some(&mentor), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Rejection reason is required");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/bookings/{id}/reject"),
            Some(&mentor),
            Some(json!({ "reason": "schedule conflict" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["status"], "rejected");
    assert_eq!(body["session"]["rejectionReason"], "schedule conflict");

    let (status, body) = app
        .call(Method::DELETE, &format!("/bookings/{id}/cancel"), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot cancel a rejected session");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app
        .call(Method::POST, &format!("/bookings/{missing}/complete"), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn complete_then_cancel_is_refused() {
    let app = TestApp::with_provider(RecordingProvider::unreachable()).await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    let (_, created) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.mentor, "2025-06-03T09:00:00Z", "Finish line")),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, confirmed) = app
        .call(Method::POST, &format!("/bookings/{id}/confirm"), Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["meetingCreated"], false);
    assert_eq!(confirmed["session"]["meetingPassword"], "mentorconnect");

    let (status, body) = app
        .call(Method::POST, &format!("/bookings/{id}/complete"), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session marked as completed");

    let (status, body) = app
        .call(Method::DELETE, &format!("/bookings/{id}/cancel"), Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot cancel a completed session");

    let (_, mine) = app.call(Method::GET, "/bookings/my", Some(&mentee), None).await;
    assert_eq!(mine[0]["status"], "completed");
}

#[tokio::test]
async fn my_bookings_lists_latest_first() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    for (start, topic) in [
        ("2025-06-04T09:00:00Z", "early"),
        ("2025-06-06T09:00:00Z", "late"),
        ("2025-06-05T09:00:00Z", "middle"),
    ] {
        let (status, _) = app
            .call(Method::POST, "/bookings", Some(&mentee), Some(booking_body(&app.mentor, start, topic)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    for cookie in [&mentee, &mentor] {
        let (status, mine) = app.call(Method::GET, "/bookings/my", Some(cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let topics: Vec<&str> = mine
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["topic"].as_str().unwrap())
            .collect();
        assert_eq!(topics, vec!["late", "middle", "early"]);
    }

    let other = app.cookie_for(&app.other_mentee).await;
    let (_, mine) = app.call(Method::GET, "/bookings/my", Some(&other), None).await;
    assert_eq!(mine, json!([]));
}

#[tokio::test]
async fn availability_round_trip() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/mentors/availability",
            Some(&mentor),
            Some(json!({
                "availability": [
                    "2099-01-01T10:00:00Z",
                    "2099-01-01T09:00:00Z",
                    "2000-01-01T09:00:00Z",
                    "garbage"
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["availability"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.mentor, "2099-01-01T09:00:00Z", "Far future")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, slots) = app
        .call(Method::GET, &format!("/mentors/{}/slots", app.mentor.id), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let open = slots["slots"].as_array().unwrap();
    assert_eq!(open.len(), 1);

    let (status, _) = app
        .call(Method::PUT, "/mentors/availability", Some(&mentee), Some(json!({ "availability": [] })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::GET, &format!("/mentors/{}/slots", app.unapproved.id), Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_answer_with_a_message() {
    let app = TestApp::new().await;
    let mentee = app.cookie_for(&app.mentee).await;
    let mentor = app.cookie_for(&app.mentor).await;

    let (_, created) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(booking_body(&app.mentor, "2025-06-07T09:00:00Z", "Shapes")),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(Method::POST, &format!("/bookings/{id}/reject"), Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Rejection reason is required");

    let (status, body) = app
        .call(
            Method::POST,
            "/bookings",
            Some(&mentee),
            Some(json!({ "mentorId": 5, "startTime": "2025-06-07T11:00:00Z", "topic": "Typed" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app
        .call(Method::POST, "/bookings", Some(&mentee), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app
        .call(Method::POST, "/bookings/not-a-uuid/confirm", Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (_, mine) = app.call(Method::GET, "/bookings/my", Some(&mentee), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["status"], "pending");
}
