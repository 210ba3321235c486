use serde::{Deserialize, Serialize};

/// Discrete editor actions, bound to keys through `EngineConfig::shortcuts`.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum EditorCommand {
    DeleteSelection,
    /// Split the selection at the playhead.
    Split,
    /// Merge the selection with the next entry on its track.
    Merge,
    AcceptSelection,
    CancelGesture,
    ZoomIn,
    ZoomOut,
}

impl EditorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::DeleteSelection => "delete_selection",
            EditorCommand::Split => "split",
            EditorCommand::Merge => "merge",
            EditorCommand::AcceptSelection => "accept_selection",
            EditorCommand::CancelGesture => "cancel_gesture",
            EditorCommand::ZoomIn => "zoom_in",
            EditorCommand::ZoomOut => "zoom_out",
        }
    }
}

impl std::fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
