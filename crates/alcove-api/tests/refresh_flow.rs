//! Exercises the 401 -> refresh -> retry flow against an in-process HTTP stub.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

use alcove_api::{ApiClient, ApiError, Session};
use alcove_types::models::UserProfile;

struct Stub {
    users_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    /// Whether the refresh endpoint hands out a new access token.
    refresh_ok: bool,
    /// Whether the users endpoint accepts the refreshed token.
    accept_refreshed: bool,
}

impl Stub {
    fn new(refresh_ok: bool, accept_refreshed: bool) -> Arc<Self> {
        Arc::new(Self {
            users_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            refresh_ok,
            accept_refreshed,
        })
    }
}

async fn users_all(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    stub.users_calls.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if auth == "Bearer token-2" && stub.accept_refreshed {
        Ok(Json(json!([
            {"id": "u1", "email": "me@example.com", "full_name": "Current User"},
            {"id": "u2", "email": "bob@example.com", "full_name": "Bob Smith"}
        ])))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn refresh_token(
    State(stub): State<Arc<Stub>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    stub.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if body["refresh"] != "refresh-1" {
        return Err(StatusCode::BAD_REQUEST);
    }
    if stub.refresh_ok {
        Ok(Json(json!({"access": "token-2"})))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn spawn_stub(stub: Arc<Stub>) -> String {
    let app = Router::new()
        .route("/users/all/", get(users_all))
        .route("/auth/refresh-token/", post(refresh_token))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn expired_session() -> Arc<Session> {
    let me: UserProfile = serde_json::from_str(
        r#"{"id": "u1", "email": "me@example.com", "full_name": "Current User"}"#,
    )
    .unwrap();
    Arc::new(Session::new(me, "token-1".into(), "refresh-1".into()))
}

#[tokio::test]
async fn expired_credential_is_refreshed_once_and_call_retried() {
    let stub = Stub::new(true, true);
    let base = spawn_stub(stub.clone()).await;

    let refreshed = Arc::new(std::sync::Mutex::new(None::<String>));
    let seen = refreshed.clone();
    let session = expired_session();
    let client = ApiClient::new(reqwest::Client::new(), &base, session.clone())
        .with_refresh_listener(move |token| {
            *seen.lock().unwrap() = Some(token.to_string());
        });

    let users = client.fetch_users().await.unwrap();

    // The directory excludes the current user.
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, "u2");

    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.users_calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.access_token(), "token-2");
    assert_eq!(refreshed.lock().unwrap().as_deref(), Some("token-2"));
}

#[tokio::test]
async fn refresh_failure_surfaces_session_expired() {
    let stub = Stub::new(false, true);
    let base = spawn_stub(stub.clone()).await;

    let client = ApiClient::new(reqwest::Client::new(), &base, expired_session());
    let err = client.fetch_users().await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);
    // Original call only — no retry with a credential we never got.
    assert_eq!(stub.users_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_rejection_does_not_refresh_again() {
    let stub = Stub::new(true, false);
    let base = spawn_stub(stub.clone()).await;

    let client = ApiClient::new(reqwest::Client::new(), &base, expired_session());
    let err = client.fetch_users().await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired));
    // Exactly one refresh and one retry: the guard stops the loop.
    assert_eq!(stub.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.users_calls.load(Ordering::SeqCst), 2);
}
