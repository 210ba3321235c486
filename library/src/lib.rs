//! Timeline annotation engine.
//!
//! Loads a media annotation document into a track-based model, edits it
//! through pointer gestures and commands, and writes it back in the shape it
//! was read.

pub mod adapter;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod media;
pub mod model;
pub mod subtitles;

pub use adapter::{DocumentAdapter, DocumentMeta, LoadedDocument};
pub use config::EngineConfig;
pub use editor::{EditorCommand, EditorSession, InteractionController, SplitMergeOperator};
pub use error::{EngineError, Rejection};
pub use export::{CueExporter, CueSnapshot};
pub use geometry::TimelineGeometry;
pub use media::MediaClock;
pub use model::{Entry, EntryId, Origin, Provenance, Timeline, TrackKind};
