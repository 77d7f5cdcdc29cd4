// Core domain types shared by the relay server and launcher clients.

use serde::{Deserialize, Serialize};

/// Caller-supplied user record established at `hello` time.
///
/// The relay trusts this record entirely; it is never validated against an
/// external source. `id` is the stable key correlating a connection to its
/// voice state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Display roles in the order the launcher resolved them.
    #[serde(default)]
    pub display_roles: Vec<String>,
}

/// Mutable per-user state within the shared voice room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipant {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub muted: bool,
    pub speaker_muted: bool,
    pub speaking: bool,
    pub camera_on: bool,
    pub streaming: bool,
}

impl VoiceParticipant {
    /// A fresh participant with every flag lowered.
    pub fn from_identity(identity: &UserIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.name.clone(),
            avatar: identity.avatar.clone(),
            muted: false,
            speaker_muted: false,
            speaking: false,
            camera_on: false,
            streaming: false,
        }
    }

    /// Shallow merge: fields absent from the patch keep their prior value.
    pub fn apply(&mut self, patch: &VoiceStatePatch) {
        if let Some(muted) = patch.muted {
            self.muted = muted;
        }
        if let Some(speaker_muted) = patch.speaker_muted {
            self.speaker_muted = speaker_muted;
        }
        if let Some(speaking) = patch.speaking {
            self.speaking = speaking;
        }
        if let Some(camera_on) = patch.camera_on {
            self.camera_on = camera_on;
        }
        if let Some(streaming) = patch.streaming {
            self.streaming = streaming;
        }
    }
}

/// Partial update to a participant's voice flags.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
}
