// Voice presence store: who is in the shared voice room, in join order.

use lobby_common::types::{UserIdentity, VoiceParticipant, VoiceStatePatch};

#[derive(Debug, Default)]
pub struct PresenceStore {
    participants: Vec<VoiceParticipant>,
}

impl PresenceStore {
    /// Add a participant for `identity`, or return the existing record
    /// unchanged. Joining twice without leaving never resets flags.
    pub fn join(&mut self, identity: &UserIdentity) -> &VoiceParticipant {
        match self.index_of(&identity.id) {
            Some(index) => &self.participants[index],
            None => {
                self.participants.push(VoiceParticipant::from_identity(identity));
                let index = self.participants.len() - 1;
                &self.participants[index]
            }
        }
    }

    /// Remove the participant keyed by `id`. Returns false when absent.
    pub fn leave(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.participants.remove(index);
                true
            }
            None => false,
        }
    }

    /// Merge `patch` into the participant keyed by `id`. Unknown ids are a
    /// no-op and never create a participant; returns whether a merge happened.
    pub fn apply_state(&mut self, id: &str, patch: &VoiceStatePatch) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.participants[index].apply(patch);
                true
            }
            None => false,
        }
    }

    /// Current membership in join order, cloned for use in outbound payloads.
    pub fn snapshot(&self) -> Vec<VoiceParticipant> {
        self.participants.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.participants.iter().position(|participant| participant.id == id)
    }
}
