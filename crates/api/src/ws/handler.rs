use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use intake_core::realtime::{
    verify_channel_grant, ConnectionEstablished, Frame, SubscribeRequest,
    EVENT_CONNECTION_ESTABLISHED, EVENT_SUBSCRIBE, EVENT_SUBSCRIPTION_ERROR,
    EVENT_SUBSCRIPTION_SUCCEEDED,
};
use serde_json::json;

use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The socket receives no channel events until it subscribes with a grant
/// from `POST /realtime/auth`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Registers the connection and announces its socket id.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Handles `subscribe` frames on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let socket_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(socket_id = %socket_id, "WebSocket connected");

    let ws_manager = state.ws_manager.clone();
    let mut rx = ws_manager.add(socket_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    let sender_socket_id = socket_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let is_close = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(socket_id = %sender_socket_id, "WebSocket sink closed");
                break;
            }
            if is_close {
                break;
            }
        }
    });

    let payload = ConnectionEstablished {
        socket_id: socket_id.clone(),
    };
    let established = Frame::new(EVENT_CONNECTION_ESTABLISHED, json!(payload));
    send_frame(&state, &socket_id, &established).await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(socket_id = %socket_id, "Pong received");
            }
            Ok(Message::Text(text)) => handle_text(&state, &socket_id, text.as_str()).await,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(socket_id = %socket_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&socket_id).await;
    send_task.abort();
    tracing::info!(socket_id = %socket_id, "WebSocket disconnected");
}

/// Dispatch one inbound text frame.
async fn handle_text(state: &AppState, socket_id: &str, text: &str) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(socket_id, error = %e, "Ignoring malformed frame");
            return;
        }
    };

    if frame.event != EVENT_SUBSCRIBE {
        tracing::debug!(socket_id, event = %frame.event, "Ignoring unsupported client event");
        return;
    }

    let request: SubscribeRequest = match serde_json::from_value(frame.data) {
        Ok(request) => request,
        Err(e) => {
            let reply = Frame::new(EVENT_SUBSCRIPTION_ERROR, json!({ "error": e.to_string() }));
            send_frame(state, socket_id, &reply).await;
            return;
        }
    };

    let realtime = &state.config.realtime;
    let now = chrono::Utc::now().timestamp();
    let verdict = verify_channel_grant(&realtime.key, &realtime.secret, socket_id, &request, now);
    let reply = match verdict {
        Ok(()) => {
            state.ws_manager.subscribe(socket_id, &request.channel).await;
            tracing::info!(socket_id, channel = %request.channel, "Channel subscribed");
            Frame::new(EVENT_SUBSCRIPTION_SUCCEEDED, json!({})).on_channel(&request.channel)
        }
        Err(e) => {
            tracing::warn!(
                socket_id,
                channel = %request.channel,
                error = %e,
                "Channel grant refused"
            );
            Frame::new(EVENT_SUBSCRIPTION_ERROR, json!({ "error": e.to_string() }))
                .on_channel(&request.channel)
        }
    };
    send_frame(state, socket_id, &reply).await;
}

async fn send_frame(state: &AppState, socket_id: &str, frame: &Frame) {
    match serde_json::to_string(frame) {
        Ok(text) => {
            state.ws_manager.send_to(socket_id, Message::Text(text.into())).await;
        }
        Err(e) => tracing::error!(socket_id, error = %e, "Failed to encode frame"),
    }
}
