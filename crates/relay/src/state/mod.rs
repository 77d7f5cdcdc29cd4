// Shared relay state: the connection registry, voice presence store, and
// chat history, guarded by one lock so every broadcast reflects a
// fully-applied view.

mod history;
mod presence;
mod registry;

pub use history::{ChatHistory, CHAT_HISTORY_CAPACITY};
pub use presence::PresenceStore;
pub use registry::{Connection, ConnectionRegistry};

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque identifier for one websocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything the message dispatcher mutates.
///
/// Lives behind a single [`RwLock`]: a handler takes the write guard, applies
/// its mutation, and builds the outbound payloads from the same guard scope,
/// so no client ever observes a mid-mutation view.
#[derive(Debug, Default)]
pub struct RoomState {
    pub registry: ConnectionRegistry,
    pub presence: PresenceStore,
    pub history: ChatHistory,
}

/// Shared server context handed to every connection task.
#[derive(Debug, Clone, Default)]
pub struct RelayState {
    room: Arc<RwLock<RoomState>>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// All mutation and snapshot reads go through this one lock.
    pub fn room(&self) -> &RwLock<RoomState> {
        &self.room
    }
}
