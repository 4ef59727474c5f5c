pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, OUTBOUND_QUEUE_SIZE};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room: Option<String>,
    pub name: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: room={:?}, name={:?}",
        params.room,
        params.name
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

fn to_frame(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            None
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE_SIZE);
    let joined = match state.rooms.resolve(params.room.as_deref()).await {
        Ok(room) => room.join(params.name, tx).await.map(|id| (room, id)),
        Err(e) => Err(e),
    };
    let (room, player_id) = match joined {
        Ok(joined) => joined,
        Err(e) => {
            tracing::info!("Rejecting WebSocket connection: {}", e);
            let error = ServerMessage::Error {
                code: e.code().to_string(),
                msg: e.to_string(),
            };
            if let Some(frame) = to_frame(&error) {
                let _ = sender.send(frame).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    tracing::info!(room = %room.code(), player = %player_id, "WebSocket connected");

    // Drain the outbound queue into the socket
    let mut writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(frame) = to_frame(&msg) else {
                continue;
            };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(room = %room.code(), player = %player_id, "Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &player_id, &room).await;
                            }
                            Err(e) => {
                                tracing::warn!(room = %room.code(), player = %player_id, "Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                room.send_to(&player_id, error).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(room = %room.code(), player = %player_id, "WebSocket closed");
                        break;
                    }
                    // Pings are answered by axum
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(room = %room.code(), player = %player_id, "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    room.leave(&player_id).await;
    writer.abort();
    state.rooms.remove_if_empty(room.code()).await;
    tracing::info!(room = %room.code(), player = %player_id, "WebSocket connection closed");
}
