// Message dispatch: validates inbound frames, mutates the shared room state,
// and fans the resulting view out to connections.
//
// Invalid frames are absorbed locally. The relay never sends an error frame
// back and never closes a connection over a bad payload; a client that sends
// garbage simply sees no state change.

use std::collections::BTreeMap;

use lobby_common::protocol::ws::{self, ClientMessage, ServerMessage, UserRoles};
use lobby_common::types::{UserIdentity, VoiceStatePatch};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::metrics;
use crate::state::{ConnId, RelayState, RoomState};

/// A payload addressed to one connection. Plans are built under the room
/// lock so each one reflects a single consistent snapshot; the sends happen
/// after the guard is released.
type Delivery = (mpsc::UnboundedSender<ServerMessage>, ServerMessage);

pub(crate) async fn attach(
    state: &RelayState,
    conn_id: ConnId,
    sender: mpsc::UnboundedSender<ServerMessage>,
) {
    let mut room = state.room().write().await;
    room.registry.attach(conn_id, sender);
    publish_gauges(&room);
}

pub(crate) async fn handle_frame(state: &RelayState, conn_id: ConnId, raw: &str) {
    let message = match ws::decode_client_message(raw) {
        Ok(message) => message,
        Err(error) => {
            debug!(conn_id = %conn_id, error = %error, "dropping undecodable frame");
            metrics::record_ws_dropped("undecodable");
            return;
        }
    };

    match message {
        ClientMessage::Hello { user } => handle_hello(state, conn_id, user).await,
        ClientMessage::ChatMessage { message } => {
            handle_chat_message(state, conn_id, message).await
        }
        ClientMessage::JoinVoice => handle_join_voice(state, conn_id).await,
        ClientMessage::LeaveVoice => handle_leave_voice(state, conn_id).await,
        ClientMessage::VoiceState { user_id, state: patch } => {
            handle_voice_state(state, conn_id, user_id, patch).await
        }
    }
}

async fn handle_hello(state: &RelayState, conn_id: ConnId, user: UserIdentity) {
    let deliveries = {
        let mut room = state.room().write().await;
        if !room.registry.register(conn_id, user.clone()) {
            // The first binding stays authoritative; repeated hellos are ignored.
            debug!(conn_id = %conn_id, user_id = %user.id, "ignoring repeated hello");
            metrics::record_ws_dropped("hello");
            return;
        }
        info!(conn_id = %conn_id, user_id = %user.id, name = %user.name, "user registered");
        metrics::record_ws_message("hello");
        publish_gauges(&room);

        let mut deliveries = Vec::new();
        if let Some(sender) = room.registry.sender_of(conn_id) {
            deliveries.push((
                sender.clone(),
                ServerMessage::ChatHistory { messages: room.history.snapshot() },
            ));
            deliveries.push((
                sender.clone(),
                ServerMessage::UserList { users: roles_of_others(&room, conn_id) },
            ));
            deliveries.push((
                sender.clone(),
                ServerMessage::VoiceUsers { users: room.presence.snapshot() },
            ));
        }
        deliveries.extend(plan_broadcast_except(
            &room,
            conn_id,
            ServerMessage::UserJoined { user },
        ));
        deliveries
    };
    deliver(deliveries);
}

async fn handle_chat_message(state: &RelayState, conn_id: ConnId, message: Value) {
    if message.is_null() {
        debug!(conn_id = %conn_id, "dropping chat frame without a body");
        metrics::record_ws_dropped("chat_message");
        return;
    }
    metrics::record_ws_message("chat_message");

    let deliveries = {
        let mut room = state.room().write().await;
        room.history.push(message.clone());
        publish_gauges(&room);
        plan_broadcast(&room, ServerMessage::ChatMessage { message })
    };
    deliver(deliveries);
}

async fn handle_join_voice(state: &RelayState, conn_id: ConnId) {
    let deliveries = {
        let mut room = state.room().write().await;
        let Some(identity) = room.registry.identity_of(conn_id).cloned() else {
            debug!(conn_id = %conn_id, "dropping join_voice from unidentified connection");
            metrics::record_ws_dropped("join_voice");
            return;
        };
        room.presence.join(&identity);
        info!(user_id = %identity.id, "user joined voice");
        metrics::record_ws_message("join_voice");
        publish_gauges(&room);
        plan_broadcast(&room, ServerMessage::VoiceUsers { users: room.presence.snapshot() })
    };
    deliver(deliveries);
}

async fn handle_leave_voice(state: &RelayState, conn_id: ConnId) {
    let deliveries = {
        let mut room = state.room().write().await;
        let Some(identity) = room.registry.identity_of(conn_id).cloned() else {
            debug!(conn_id = %conn_id, "dropping leave_voice from unidentified connection");
            metrics::record_ws_dropped("leave_voice");
            return;
        };
        room.presence.leave(&identity.id);
        info!(user_id = %identity.id, "user left voice");
        metrics::record_ws_message("leave_voice");
        publish_gauges(&room);
        plan_broadcast(&room, ServerMessage::VoiceUsers { users: room.presence.snapshot() })
    };
    deliver(deliveries);
}

async fn handle_voice_state(
    state: &RelayState,
    conn_id: ConnId,
    user_id: String,
    patch: VoiceStatePatch,
) {
    metrics::record_ws_message("voice_state");
    let deliveries = {
        let mut room = state.room().write().await;
        if !room.presence.apply_state(&user_id, &patch) {
            debug!(conn_id = %conn_id, user_id = %user_id, "voice_state for absent participant");
        }
        // The roster refresh goes out even when the target was absent.
        plan_broadcast(&room, ServerMessage::VoiceUsers { users: room.presence.snapshot() })
    };
    deliver(deliveries);
}

pub(crate) async fn handle_disconnect(state: &RelayState, conn_id: ConnId) {
    let deliveries = {
        let mut room = state.room().write().await;
        let identity = room.registry.detach(conn_id);
        let deliveries = match identity {
            Some(identity) if room.presence.leave(&identity.id) => {
                info!(user_id = %identity.id, "user disconnected while in voice");
                plan_broadcast(&room, ServerMessage::VoiceUsers { users: room.presence.snapshot() })
            }
            _ => Vec::new(),
        };
        publish_gauges(&room);
        deliveries
    };
    deliver(deliveries);
}

/// Display roles of every registered identity other than `conn_id`'s own.
fn roles_of_others(room: &RoomState, conn_id: ConnId) -> BTreeMap<String, UserRoles> {
    room.registry
        .connections()
        .iter()
        .filter(|connection| connection.id != conn_id)
        .filter_map(|connection| connection.identity.as_ref())
        .map(|identity| {
            (identity.id.clone(), UserRoles { display_roles: identity.display_roles.clone() })
        })
        .collect()
}

fn plan_broadcast(room: &RoomState, message: ServerMessage) -> Vec<Delivery> {
    room.registry
        .connections()
        .iter()
        .map(|connection| (connection.sender.clone(), message.clone()))
        .collect()
}

fn plan_broadcast_except(
    room: &RoomState,
    exclude: ConnId,
    message: ServerMessage,
) -> Vec<Delivery> {
    room.registry
        .connections()
        .iter()
        .filter(|connection| connection.id != exclude)
        .map(|connection| (connection.sender.clone(), message.clone()))
        .collect()
}

fn deliver(deliveries: Vec<Delivery>) {
    for (sender, message) in deliveries {
        // A closed receiver means that connection is tearing down; its own
        // disconnect path cleans up.
        let _ = sender.send(message);
    }
}

fn publish_gauges(room: &RoomState) {
    metrics::set_connected_clients(room.registry.len() as u64);
    metrics::set_registered_identities(room.registry.identified_count() as u64);
    metrics::set_voice_participants(room.presence.len() as u64);
    metrics::set_chat_history_depth(room.history.len() as u64);
}
