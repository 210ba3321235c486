pub mod srt;

pub use srt::{SrtCue, ingest_srt, parse_srt};
