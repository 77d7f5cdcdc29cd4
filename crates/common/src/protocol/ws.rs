// WebSocket message types for the lobby relay protocol.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{UserIdentity, VoiceParticipant, VoiceStatePatch};

/// Client -> server frames.
///
/// Frames whose `type` discriminator is not one of these variants, or whose
/// required fields are absent, fail to decode; the relay drops them without
/// replying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Announces the caller's identity. First binding for a connection wins.
    Hello { user: UserIdentity },

    /// An opaque chat payload, stored and re-broadcast verbatim.
    ChatMessage { message: Value },

    /// Enter the shared voice room.
    JoinVoice,

    /// Leave the shared voice room.
    LeaveVoice,

    /// Patch a participant's voice flags.
    VoiceState {
        #[serde(rename = "userId")]
        user_id: String,
        state: VoiceStatePatch,
    },
}

/// Server -> client frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Replay of the bounded chat history, oldest first.
    ChatHistory { messages: Vec<Value> },

    /// Display roles of every other registered user, keyed by user id.
    UserList { users: BTreeMap<String, UserRoles> },

    /// A newly registered user, announced to everyone else.
    UserJoined { user: UserIdentity },

    /// A chat payload fanned out to every connection.
    ChatMessage { message: Value },

    /// Full voice roster after any membership or flag change.
    VoiceUsers { users: Vec<VoiceParticipant> },
}

/// Role information carried per user in `user_list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRoles {
    #[serde(rename = "displayRoles", default)]
    pub display_roles: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not a recognized client message: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("server message failed to serialize: {0}")]
    Encode(#[source] serde_json::Error),
}

pub fn decode_client_message(raw: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(raw).map_err(ProtocolError::Decode)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}
