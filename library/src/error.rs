use thiserror::Error;

use crate::model::capability::{Capability, TrackKind};
use crate::model::entry::EntryId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("Document error: {0}")]
    Document(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    pub fn document(msg: impl Into<String>) -> Self {
        EngineError::Document(msg.into())
    }
}

/// An edit the engine declined. Rejections are expected outcomes of user
/// input, not failures: the model is left untouched and the message is shown
/// to the user as a short notice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("{kind} track does not allow {capability}")]
    CapabilityDenied {
        kind: TrackKind,
        capability: Capability,
    },
    #[error("duration {duration:.3}s is below the minimum of {min:.3}s")]
    DurationTooShort { duration: f64, min: f64 },
    #[error("time value must be finite")]
    InvalidTime,
    #[error("entry {0} not found")]
    EntryNotFound(EntryId),
    #[error("nothing selected")]
    NoSelection,
    #[error("another gesture is in progress")]
    GestureInProgress,
    #[error("cannot split at the edge of a clip ({time:.3}s)")]
    SplitAtEdge { time: f64 },
    #[error("no clip after the selection to merge with")]
    NoSuccessor,
    #[error("speakers differ ({left} / {right})")]
    SpeakerMismatch { left: String, right: String },
}
