mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use daycare_sdk::models::{NewMessage, NewNotification, NotificationType, Role};
use daycare_sdk::{app, AppConfig, AppState, CareClient};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    app(AppState::new(common::client(), AppConfig::default()))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    b.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_and_ready_answer() {
    let app = router();
    let (status, _) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn children_are_created_and_listed_in_the_envelope() {
    let app = router();
    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/children",
            json!({ "first_name": "Ava", "last_name": "Rivera" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["first_name"], "Ava");
    assert_eq!(created["data"]["is_active"], true);

    let (status, listed) = send(&app, get("/api/v1/children", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["count"], 1);
    assert_eq!(listed["data"][0]["id"], created["data"]["id"]);
}

#[tokio::test]
async fn blank_names_are_rejected_with_an_error_body() {
    let app = router();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/children",
            json!({ "first_name": "  ", "last_name": "Rivera" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn unknown_id_is_404() {
    let app = router();
    let uri = format!("/api/v1/children/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, get(&uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_requires_a_bearer_token() {
    let app = router();
    let (status, _) = send(&app, get("/api/v1/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, get("/api/v1/me", Some("not-a-session"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_me() {
    let app = router();
    let (status, signed_up) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/signup",
            json!({
                "email": "maria@example.org",
                "password": "sunflower42",
                "full_name": "Maria Rivera",
                "role": "admin"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // self sign-up cannot pick a staff role
    assert_eq!(signed_up["data"]["role"], "parent");

    let (status, login) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "maria@example.org", "password": "sunflower42" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["data"]["token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, get("/api/v1/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "maria@example.org");

    let (status, unread) = send(&app, get("/api/v1/notifications/unread-count", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread["data"]["count"], 0);

    // parents cannot change school settings
    let (status, _) = send(
        &app,
        json_request("PATCH", "/api/v1/settings", json!({ "school_name": "Sunny Days" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_password_is_401() {
    let app = router();
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "ghost@example.org", "password": "sunflower42" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn empty(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn signed_in(c: &CareClient, email: &str, name: &str) -> (uuid::Uuid, String) {
    let user = c.auth().signup(email, "sunflower42", name, Role::Parent).await.unwrap();
    let (session, _) = c.auth().login(email, "sunflower42").await.unwrap();
    (user.id, session.token)
}

#[tokio::test]
async fn notifications_can_only_be_changed_by_their_owner() {
    let c = common::client();
    let app = app(AppState::new(c.clone(), AppConfig::default()));
    let (alice, alice_token) = signed_in(&c, "alice@example.org", "Alice").await;
    let (_, bob_token) = signed_in(&c, "bob@example.org", "Bob").await;
    let note = c
        .notifications()
        .create(&NewNotification {
            user_id: alice,
            notification_type: NotificationType::System,
            title: "Reminder".into(),
            message: "Pick-up at 3pm".into(),
            link: None,
        })
        .await
        .unwrap();

    let read_uri = format!("/api/v1/notifications/{}/read", note.id);
    let uri = format!("/api/v1/notifications/{}", note.id);
    let (status, _) = send(&app, empty("POST", &read_uri, &bob_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, empty("DELETE", &uri, &bob_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(c.notifications().unread_count(&alice).await.unwrap(), 1);

    let (status, body) = send(&app, empty("POST", &read_uri, &alice_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);
    let (status, _) = send(&app, empty("DELETE", &uri, &alice_token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn messages_can_only_be_changed_by_their_parties() {
    let c = common::client();
    let app = app(AppState::new(c.clone(), AppConfig::default()));
    let (alice, alice_token) = signed_in(&c, "alice@example.org", "Alice").await;
    let (bob, bob_token) = signed_in(&c, "bob@example.org", "Bob").await;
    let (_, carol_token) = signed_in(&c, "carol@example.org", "Carol").await;
    let msg = c
        .messages()
        .send(&NewMessage {
            sender_id: bob,
            recipient_id: alice,
            child_id: None,
            content: "See you at pick-up".into(),
        })
        .await
        .unwrap();

    let read_uri = format!("/api/v1/messages/{}/read", msg.id);
    let uri = format!("/api/v1/messages/{}", msg.id);
    // the sender cannot mark the recipient's copy read
    let (status, _) = send(&app, empty("POST", &read_uri, &bob_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, empty("DELETE", &uri, &carol_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, empty("POST", &read_uri, &alice_token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, empty("DELETE", &uri, &bob_token)).await;
    assert_eq!(status, StatusCode::OK);
}
