// lobby-common: shared types and wire protocol for the lobby relay workspace

pub mod protocol;
pub mod types;
