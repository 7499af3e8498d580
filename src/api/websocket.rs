use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::state::{AppState, WsEvent};

#[derive(Debug, Deserialize)]
struct WsIncoming {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    tab_id: Option<i64>,
}

#[derive(Debug, Serialize, Default)]
struct WsOutgoing {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tab_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<WsEvent> for WsOutgoing {
    fn from(event: WsEvent) -> Self {
        match event {
            WsEvent::ActionRecorded { session_id, action } => WsOutgoing {
                msg_type: "action_recorded".to_string(),
                session_id: Some(session_id),
                action: Some(serde_json::to_value(&action).unwrap_or_default()),
                ..Default::default()
            },
            WsEvent::SessionStatus { session_id, status } => WsOutgoing {
                msg_type: "session_status".to_string(),
                session_id: Some(session_id),
                status: Some(serde_json::to_value(status).unwrap_or_default()),
                ..Default::default()
            },
            WsEvent::RearmRequested { tab_id } => WsOutgoing {
                msg_type: "rearm_requested".to_string(),
                tab_id: Some(tab_id),
                ..Default::default()
            },
            WsEvent::Error { session_id, error } => WsOutgoing {
                msg_type: "error".to_string(),
                session_id,
                error: Some(error),
                ..Default::default()
            },
            WsEvent::Pong => WsOutgoing {
                msg_type: "pong".to_string(),
                ..Default::default()
            },
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request from client: {}", client_id);
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

async fn handle_socket(socket: WebSocket, client_id: String, state: Arc<AppState>) {
    state.client_connected(&client_id);

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe();

    // Forward broadcast events to this client
    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let json = match serde_json::to_string(&WsOutgoing::from(event)) {
                Ok(j) => j,
                Err(_) => continue,
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let state_clone = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(incoming) = serde_json::from_str::<WsIncoming>(&text) {
                    handle_incoming(&state_clone, incoming);
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.client_disconnected(&client_id);
}

fn handle_incoming(state: &AppState, incoming: WsIncoming) {
    match (incoming.msg_type.as_str(), incoming.tab_id) {
        ("ping", _) => state.broadcast(WsEvent::Pong),
        // the in-page recorder answering a rearm_requested event
        ("armed", Some(tab_id)) => state.acknowledge_armed(tab_id),
        (other, _) => tracing::debug!("Ignoring WebSocket message of type {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;

    #[test]
    fn test_outgoing_shapes() {
        let status = serde_json::to_value(WsOutgoing::from(WsEvent::SessionStatus {
            session_id: "s1".to_string(),
            status: SessionStatus::Paused,
        }))
        .unwrap();
        assert_eq!(status["type"], "session_status");
        assert_eq!(status["status"], "paused");
        assert!(status.get("error").is_none());

        let rearm = serde_json::to_value(WsOutgoing::from(WsEvent::RearmRequested { tab_id: 7 })).unwrap();
        assert_eq!(rearm["type"], "rearm_requested");
        assert_eq!(rearm["tab_id"], 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_message_acknowledges_rearm() {
        let state = Arc::new(AppState::default());
        let mut page = state.subscribe();
        let responder = Arc::clone(&state);
        tokio::spawn(async move {
            if let Ok(WsEvent::RearmRequested { tab_id }) = page.recv().await {
                let message = format!(r#"{{"type": "armed", "tab_id": {}}}"#, tab_id);
                handle_incoming(&responder, serde_json::from_str(&message).unwrap());
            }
        });
        tokio_test::assert_ok!(state.page_agent.arm(11).await);
    }
}
