//! End-to-end gateway checks against a local axum stub over real HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use notifydesk::config::Timeouts;
use notifydesk::net::api::ApiClient;
use notifydesk::net::error::ApiError;
use notifydesk::net::transport::ReqwestTransport;
use notifydesk::net::types::{
    CreateNotificationRequest, LoginRequest, NotificationStatus, NotificationType, User,
};
use notifydesk::state::auth::{AuthPhase, AuthService};
use notifydesk::state::session::SessionStore;
use notifydesk::state::storage::MemoryStorage;
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Stub {
    seen_auth: Arc<Mutex<Vec<Option<String>>>>,
    seen_query: Arc<Mutex<Vec<Option<String>>>>,
}

async fn login() -> Json<Value> {
    Json(json!({
        "message": "Login successful",
        "token": "tok-1",
        "user": { "id": "u1", "email": "a@b.com", "fname": "Ada", "lname": "Lovelace", "designation": "Engineer" }
    }))
}

async fn notifications(State(stub): State<Stub>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_owned);
    stub.seen_auth.lock().unwrap().push(auth.clone());
    if auth.as_deref() == Some("Bearer tok-1") {
        (StatusCode::OK, Json(json!([{ "_id": "n1", "type": "push", "recipients": ["dev"], "subject": "s", "message": "m" }])))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid token" })))
    }
}

async fn logs(
    State(stub): State<Stub>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    stub.seen_query.lock().unwrap().push(params.get("status").cloned());
    Json(json!([]))
}

async fn broken() -> (StatusCode, Json<Value>) {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": ["subject is required", "message is required"] })))
}

async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/notifications", get(notifications).post(broken))
        .route("/notifications/logs", get(logs))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn service(base_url: String) -> AuthService {
    let session = Arc::new(SessionStore::new(MemoryStorage::new()));
    let transport = ReqwestTransport::new(Timeouts::default()).unwrap();
    AuthService::new(Arc::new(ApiClient::new(transport, base_url, session)))
}

#[tokio::test]
async fn login_then_list_sends_bearer_token() {
    let stub = Stub::default();
    let auth = service(spawn_stub(stub.clone()).await);
    auth.init();

    let user = auth
        .login(&LoginRequest { email: "a@b.com".to_owned(), password: "pw".to_owned() })
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Ada Lovelace");

    let list = auth.api().list_notifications().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "n1");
    assert_eq!(stub.seen_auth.lock().unwrap().as_slice(), &[Some("Bearer tok-1".to_owned())]);
}

#[tokio::test]
async fn rejected_token_forces_logout_and_fires_listener() {
    let stub = Stub::default();
    let auth = service(spawn_stub(stub.clone()).await);
    auth.api().session().save("stale", &User {
        id: "u1".to_owned(),
        email: "a@b.com".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        designation: String::new(),
    })
    .unwrap();
    assert!(auth.init().user().is_some());

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    auth.api().on_auth_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = auth.api().list_notifications().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { message: Some(ref m) } if m == "Invalid token"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(auth.phase(), AuthPhase::Anonymous);
    assert!(auth.api().session().load().is_none());
}

#[tokio::test]
async fn array_messages_are_joined_from_error_bodies() {
    let auth = service(spawn_stub(Stub::default()).await);
    let request = CreateNotificationRequest {
        kind: NotificationType::Email,
        recipients: vec!["a@b.com".to_owned()],
        subject: String::new(),
        message: String::new(),
    };
    let err = auth.api().create_notification(&request).await.unwrap_err();
    match err {
        ApiError::Backend { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "subject is required, message is required");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn log_filter_travels_as_query_parameter() {
    let stub = Stub::default();
    let auth = service(spawn_stub(stub.clone()).await);
    auth.api().list_logs(Some(NotificationStatus::Scheduled)).await.unwrap();
    auth.api().list_logs(None).await.unwrap();
    assert_eq!(stub.seen_query.lock().unwrap().as_slice(), &[Some("scheduled".to_owned()), None]);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let auth = service(format!("http://{addr}"));
    let err = auth.api().list_notifications().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert_eq!(err.user_message(), "unable to reach the notification service");
}
