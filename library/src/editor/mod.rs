//! Editing services - the surface a host UI drives.
//!
//! Pointer gestures go through `InteractionController`, discrete commands
//! through `SplitMergeOperator`, and `EditorSession` bundles both with the
//! open document.

pub mod command;
pub mod interaction;
pub mod session;
pub mod split_merge;

// Re-exports for convenient access
pub use command::EditorCommand;
pub use interaction::{CursorHint, Edge, GestureOutcome, GestureState, HitTarget, InteractionController};
pub use session::{EditorSession, Notice, NoticeLevel};
pub use split_merge::SplitMergeOperator;
