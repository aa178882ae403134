#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use intake_api::auth::jwt::{generate_access_token, JwtConfig};
use intake_api::auth::password::hash_password;
use intake_api::config::{RealtimeConfig, ServerConfig};
use intake_api::media::{MediaConfirmer, MediaError, NoopConfirmer};
use intake_api::notifications::SubmissionNotifier;
use intake_api::router::build_app_router;
use intake_api::state::AppState;
use intake_api::ws::WsManager;
use intake_db::models::user::{CreateUser, User};
use intake_db::repositories::UserRepo;
use intake_events::{BackgroundDispatcher, DispatcherHandle, EventBus};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const TEST_REALTIME_KEY: &str = "intake";
pub const TEST_REALTIME_SECRET: &str = "test-realtime-secret";
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and no media provider.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        realtime: RealtimeConfig {
            key: TEST_REALTIME_KEY.to_string(),
            secret: TEST_REALTIME_SECRET.to_string(),
            grant_ttl_secs: 3600,
        },
        media: None,
    }
}

/// A running application plus the pieces tests inspect.
pub struct TestHarness {
    pub app: Router,
    pub bus: Arc<EventBus>,
    pub dispatcher: DispatcherHandle,
    pub ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and an always-succeeding media store.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_harness(pool, Arc::new(NoopConfirmer)).app.clone()
}

/// Like [`build_test_app`] but keeps the event bus and dispatcher reachable
/// and lets the test choose the media store behaviour.
///
/// The background dispatcher runs on the test runtime; email is disabled.
pub fn build_test_harness(pool: PgPool, media: Arc<dyn MediaConfirmer>) -> TestHarness {
    let config = test_config();
    let ws_manager = Arc::new(WsManager::new());
    let bus = Arc::new(EventBus::default());

    let (dispatcher, handle) = BackgroundDispatcher::new(16);
    let cancel = CancellationToken::new();
    tokio::spawn(dispatcher.run(cancel.clone()));

    let notifier = SubmissionNotifier::new(pool.clone(), bus.clone(), None, handle.clone());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        notifier,
        media,
    };

    TestHarness {
        app: build_app_router(state, &config),
        bus,
        dispatcher: handle,
        ws_manager,
        cancel,
    }
}

/// Media store that refuses every confirmation.
pub struct FailingConfirmer;

#[async_trait]
impl MediaConfirmer for FailingConfirmer {
    async fn confirm(&self, _public_ids: &[String]) -> Result<(), MediaError> {
        Err(MediaError::Api {
            status: 502,
            body: "provider unavailable".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Staff accounts
// ---------------------------------------------------------------------------

/// Insert a staff user with [`TEST_PASSWORD`] and return it with a valid token.
pub async fn seed_staff(pool: &PgPool, email: &str, role: &str) -> (User, String) {
    let input = CreateUser {
        name: format!("Staff {role}"),
        email: email.to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: role.to_string(),
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    let token = generate_access_token(user.id, &user.role, &test_config().jwt)
        .expect("token generation should succeed");
    (user, token)
}

/// Number of rows currently in `table`.
pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*)::BIGINT FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A submission body the public form would post, with one track.
pub fn submission_body(name: &str, email: &str, track_title: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "email": email,
        "instagram": "https://instagram.com/someone",
        "bio": "Producer",
        "tracks": [{
            "publicId": format!("music-demos/{}", track_title.to_lowercase().replace(' ', "-")),
            "secureUrl": "https://res.cloudinary.com/demo/video/upload/track.mp3",
            "format": "mp3",
            "bytes": 4_200_000,
            "duration": 215.4,
            "title": track_title,
            "genre": "Techno",
            "bpm": 128,
            "key": "A minor"
        }]
    })
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

/// Post a raw, possibly malformed body.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    app.oneshot(request).await.expect("router is infallible")
}
