//! Integration tests for realtime channel grants and the admin WebSocket.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{
    body_json, build_test_harness, post_json, post_json_auth, seed_staff, submission_body,
    TEST_REALTIME_KEY, TEST_REALTIME_SECRET,
};
use futures::{SinkExt, StreamExt};
use intake_api::media::NoopConfirmer;
use intake_api::notifications::RealtimeRelay;
use intake_core::realtime::{
    sign_channel_grant, Frame, ADMIN_CHANNEL, EVENT_CONNECTION_ESTABLISHED,
    EVENT_NEW_SUBMISSION, EVENT_SUBSCRIPTION_ERROR, EVENT_SUBSCRIPTION_SUCCEEDED,
};
use intake_core::roles::ROLE_REVIEWER;
use sqlx::PgPool;
use tokio_tungstenite::tungstenite::Message;

const REALTIME_AUTH: &str = "/api/v1/realtime/auth";

// ---------------------------------------------------------------------------
// Grant issuance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn grant_requires_token(pool: PgPool) {
    let harness = build_test_harness(pool, Arc::new(NoopConfirmer));

    let body = serde_json::json!({ "socket_id": "abc", "channel_name": ADMIN_CHANNEL });
    let response = post_json(harness.app.clone(), REALTIME_AUTH, body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn grant_requires_socket_and_channel(pool: PgPool) {
    let harness = build_test_harness(pool.clone(), Arc::new(NoopConfirmer));
    let (_user, token) = seed_staff(&pool, "rev@label.test", ROLE_REVIEWER).await;

    let body = serde_json::json!({ "socket_id": "abc" });
    let response = post_json_auth(harness.app.clone(), REALTIME_AUTH, body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing socket_id or channel_name");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn grant_refuses_unknown_channel(pool: PgPool) {
    let harness = build_test_harness(pool.clone(), Arc::new(NoopConfirmer));
    let (_user, token) = seed_staff(&pool, "rev@label.test", ROLE_REVIEWER).await;

    let body = serde_json::json!({ "socket_id": "abc", "channel_name": "private-payroll" });
    let response = post_json_auth(harness.app.clone(), REALTIME_AUTH, body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid channel 'private-payroll'");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn grant_is_signed_for_socket_and_channel(pool: PgPool) {
    let harness = build_test_harness(pool.clone(), Arc::new(NoopConfirmer));
    let (_user, token) = seed_staff(&pool, "rev@label.test", ROLE_REVIEWER).await;

    let body = serde_json::json!({ "socket_id": "sock-1", "channel_name": ADMIN_CHANNEL });
    let response = post_json_auth(harness.app.clone(), REALTIME_AUTH, body, &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let expires_at = json["expires_at"].as_i64().expect("expires_at must be a number");
    assert!(expires_at > chrono::Utc::now().timestamp());

    let expected = sign_channel_grant(
        TEST_REALTIME_KEY,
        TEST_REALTIME_SECRET,
        "sock-1",
        ADMIN_CHANNEL,
        expires_at,
    );
    assert_eq!(json["auth"], expected);
}

// ---------------------------------------------------------------------------
// WebSocket handshake end to end
// ---------------------------------------------------------------------------

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_frame(socket: &mut Socket) -> Frame {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame should arrive")
            .expect("socket should stay open")
            .expect("frame should be readable");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("frame should be JSON");
        }
    }
}

async fn subscribe(socket: &mut Socket, auth: &str, expires_at: i64) -> Frame {
    let frame = serde_json::json!({
        "event": "subscribe",
        "data": { "channel": ADMIN_CHANNEL, "auth": auth, "expires_at": expires_at }
    });
    socket
        .send(Message::Text(frame.to_string()))
        .await
        .expect("subscribe should send");
    next_frame(socket).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn subscribed_socket_receives_new_submissions(pool: PgPool) {
    let harness = build_test_harness(pool.clone(), Arc::new(NoopConfirmer));
    let (_user, token) = seed_staff(&pool, "rev@label.test", ROLE_REVIEWER).await;
    tokio::spawn(RealtimeRelay::new(Arc::clone(&harness.ws_manager)).run(harness.bus.subscribe()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = harness.app.clone();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws"))
        .await
        .expect("upgrade should succeed");

    let established = next_frame(&mut socket).await;
    assert_eq!(established.event, EVENT_CONNECTION_ESTABLISHED);
    let socket_id = established.data["socket_id"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "socket_id": socket_id, "channel_name": ADMIN_CHANNEL });
    let grant = body_json(post_json_auth(harness.app.clone(), REALTIME_AUTH, body, &token).await).await;

    let reply = subscribe(
        &mut socket,
        grant["auth"].as_str().unwrap(),
        grant["expires_at"].as_i64().unwrap(),
    )
    .await;
    assert_eq!(reply.event, EVENT_SUBSCRIPTION_SUCCEEDED);
    assert_eq!(reply.channel.as_deref(), Some(ADMIN_CHANNEL));

    let created = body_json(
        post_json(
            harness.app.clone(),
            "/api/v1/submissions",
            submission_body("Jane Doe", "jane@example.com", "Night Drive"),
        )
        .await,
    )
    .await;

    let event = next_frame(&mut socket).await;
    assert_eq!(event.event, EVENT_NEW_SUBMISSION);
    assert_eq!(event.channel.as_deref(), Some(ADMIN_CHANNEL));
    assert_eq!(event.data["submissionId"], created["submissionId"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn forged_grant_is_refused(pool: PgPool) {
    let harness = build_test_harness(pool, Arc::new(NoopConfirmer));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = harness.app.clone();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws"))
        .await
        .expect("upgrade should succeed");
    let established = next_frame(&mut socket).await;
    assert_eq!(established.event, EVENT_CONNECTION_ESTABLISHED);

    let expires_at = chrono::Utc::now().timestamp() + 60;
    let forged = sign_channel_grant(
        TEST_REALTIME_KEY,
        "wrong-secret",
        established.data["socket_id"].as_str().unwrap(),
        ADMIN_CHANNEL,
        expires_at,
    );

    let reply = subscribe(&mut socket, &forged, expires_at).await;
    assert_eq!(reply.event, EVENT_SUBSCRIPTION_ERROR);
    assert_eq!(harness.ws_manager.subscriber_count(ADMIN_CHANNEL).await, 0);
}
