// Bounded chat history: opaque payloads replayed verbatim to late joiners.

use serde_json::Value;
use std::collections::VecDeque;

/// Maximum number of chat messages replayed to a newly connected client.
pub const CHAT_HISTORY_CAPACITY: usize = 100;

/// FIFO buffer of chat payloads, oldest evicted first. The relay never
/// inspects the payloads; they are stored and replayed as received.
#[derive(Debug)]
pub struct ChatHistory {
    messages: VecDeque<Value>,
    capacity: usize,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::with_capacity(CHAT_HISTORY_CAPACITY)
    }
}

impl ChatHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { messages: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a message, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, message: Value) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Value> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
