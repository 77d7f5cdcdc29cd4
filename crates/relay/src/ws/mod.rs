// WebSocket endpoint for the lobby relay: upgrade, per-connection socket
// loop, and teardown. Frame semantics live in `dispatch`.

mod dispatch;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use lobby_common::protocol::ws::{self as protocol, ServerMessage};
use tokio::sync::mpsc;
use tracing::debug;

use crate::state::{ConnId, RelayState};

pub fn router(state: RelayState) -> Router {
    // Served on both paths: launcher builds historically dial the bare origin.
    Router::new()
        .route("/", get(ws_upgrade))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

async fn ws_upgrade(State(state): State<RelayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: RelayState, mut socket: WebSocket) {
    let conn_id = ConnId::new();
    let (sender, mut outbound) = mpsc::unbounded_channel::<ServerMessage>();
    dispatch::attach(&state, conn_id, sender).await;
    debug!(conn_id = %conn_id, "connection opened");

    loop {
        tokio::select! {
            maybe_outbound = outbound.recv() => {
                match maybe_outbound {
                    Some(message) => {
                        if send_server_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            maybe_frame = socket.recv() => {
                let Some(frame) = maybe_frame else {
                    break;
                };

                match frame {
                    Ok(Message::Text(raw)) => dispatch::handle_frame(&state, conn_id, &raw).await,
                    Ok(Message::Ping(payload)) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        }
    }

    dispatch::handle_disconnect(&state, conn_id).await;
    debug!(conn_id = %conn_id, "connection closed");
}

async fn send_server_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let encoded = protocol::encode_server_message(message).map_err(|_| ())?;
    socket.send(Message::Text(encoded.into())).await.map_err(|_| ())
}
