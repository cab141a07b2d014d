use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use sentinel_eventhub::{Event, EventKind};

use crate::AppState;

/// `GET /ws` — live event stream. Refuses every upgrade unless basic-auth
/// credentials are configured (fail-closed, not fail-open): an operator
/// who never set credentials gets no live stream rather than an open one.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if !state.config.websocket.enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    let (Some(expected_user), Some(expected_pass)) = (
        state.config.websocket.auth_username.as_deref(),
        state.config.websocket.auth_password.as_deref(),
    ) else {
        tracing::warn!("/ws has no basic-auth credentials configured, refusing connection");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    if !basic_auth_matches(&headers, expected_user, expected_pass) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if state.event_hub.subscriber_count() >= state.config.websocket.max_connections as usize {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn basic_auth_matches(headers: &HeaderMap, user: &str, pass: &str) -> bool {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    decoded == format!("{user}:{pass}")
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe {
        #[serde(default)]
        data: SubscribeData,
    },
    Ping,
}

#[derive(Deserialize, Default)]
struct SubscribeData {
    #[serde(default)]
    events: Vec<EventKind>,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    let queue_size = state.config.websocket.subscriber_queue_size;
    let (mut sub_id, mut rx) = state.event_hub.subscribe(HashSet::new(), queue_size);

    if state.config.websocket.events.broadcast_connections {
        state.event_hub.publish(Event::new(
            EventKind::Connection,
            None,
            json!({"event": "connected", "subscriber_id": sub_id}),
        ));
    }

    let ping_interval = Duration::from_secs(state.config.websocket.ping_interval_seconds);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) {
                            match msg {
                                ClientMessage::Subscribe { data } => {
                                    state.event_hub.unsubscribe(sub_id);
                                    let filter: HashSet<EventKind> = data.events.into_iter().collect();
                                    let (new_id, new_rx) = state.event_hub.subscribe(filter, queue_size);
                                    sub_id = new_id;
                                    rx = new_rx;
                                }
                                ClientMessage::Ping => {
                                    if sink.send(Message::Text(r#"{"type":"pong"}"#.into())).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
            _ = tokio::time::sleep(ping_interval) => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.event_hub.unsubscribe(sub_id);
    if state.config.websocket.events.broadcast_connections {
        state.event_hub.publish(Event::new(
            EventKind::Connection,
            None,
            json!({"event": "disconnected", "subscriber_id": sub_id}),
        ));
    }
}
