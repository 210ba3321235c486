pub mod cue;

pub use cue::{Cue, CueExporter, CueSnapshot, SPEAKABLE_TRACKS, format_timestamp};
