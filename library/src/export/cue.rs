use std::fmt;

use ordered_float::OrderedFloat;

use crate::adapter::KindContent;
use crate::config::EngineConfig;
use crate::model::capability::TrackKind;
use crate::model::timeline::Timeline;

/// Tracks whose entries are spoken or shown as subtitles.
pub const SPEAKABLE_TRACKS: [TrackKind; 2] = [TrackKind::Dialogues, TrackKind::Captions];

#[derive(Clone, PartialEq, Debug)]
pub struct Cue {
    /// 1-based position in the snapshot.
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub track: TrackKind,
}

/// An immutable, time-ordered list of cues taken from the model at one instant.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CueSnapshot {
    cues: Vec<Cue>,
}

pub struct CueExporter {
    unknown_speaker: String,
    caption_tag: String,
}

impl CueExporter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            unknown_speaker: config.unknown_speaker.clone(),
            caption_tag: config.caption_tag.clone(),
        }
    }

    pub fn export(&self, timeline: &Timeline) -> CueSnapshot {
        let mut rows: Vec<(f64, f64, String, TrackKind)> = SPEAKABLE_TRACKS
            .into_iter()
            .flat_map(|kind| timeline.entries(kind).map(move |entry| (kind, entry)))
            .map(|(kind, entry)| {
                let text = self.cue_text(KindContent::view(kind, &entry.content));
                (entry.start, entry.end, text, kind)
            })
            .collect();
        rows.sort_by_key(|row| OrderedFloat(row.0));

        let cues = rows
            .into_iter()
            .enumerate()
            .map(|(i, (start, end, text, track))| Cue {
                index: i + 1,
                start,
                end,
                text,
                track,
            })
            .collect();
        CueSnapshot { cues }
    }

    fn cue_text(&self, content: KindContent) -> String {
        match content {
            KindContent::Dialogue {
                text,
                speaker: Some(speaker),
            } if !speaker.is_empty() && speaker != self.unknown_speaker => format!("{}: {}", speaker, text),
            KindContent::Caption { text, .. } => format!("[{}] {}", self.caption_tag, text),
            other => other.text().to_string(),
        }
    }
}

/// `HH:MM:SS.mmm`, or with `,` before the milliseconds for SRT.
pub fn format_timestamp(seconds: f64, decimal_separator: char) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        decimal_separator,
        ms
    )
}

impl CueSnapshot {
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// The cue to show at `time`, if any. The last one wins when cues overlap.
    pub fn active_at(&self, time: f64) -> Option<&Cue> {
        self.cues.iter().rev().find(|c| time >= c.start && time < c.end)
    }

    pub fn to_webvtt(&self) -> String {
        let mut out = String::from("WEBVTT\n\n");
        for cue in &self.cues {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                cue.index,
                format_timestamp(cue.start, '.'),
                format_timestamp(cue.end, '.'),
                cue.text
            ));
        }
        out
    }

    pub fn to_srt(&self) -> String {
        let mut out = String::new();
        for cue in &self.cues {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                cue.index,
                format_timestamp(cue.start, ','),
                format_timestamp(cue.end, ','),
                cue.text
            ));
        }
        out
    }
}

impl fmt::Display for CueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cue in &self.cues {
            writeln!(
                f,
                "{:>4}  {} --> {}  {}",
                cue.index,
                format_timestamp(cue.start, '.'),
                format_timestamp(cue.end, '.'),
                cue.text
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0, '.'), "00:00:00.000");
        assert_eq!(format_timestamp(3723.456, '.'), "01:02:03.456");
        assert_eq!(format_timestamp(59.9996, ','), "00:01:00,000");
        assert_eq!(format_timestamp(-2.0, '.'), "00:00:00.000");
    }

    #[test]
    fn snapshot_renders_webvtt_and_srt() {
        let snapshot = CueSnapshot {
            cues: vec![Cue {
                index: 1,
                start: 1.5,
                end: 2.25,
                text: "Ann: hi".to_string(),
                track: TrackKind::Dialogues,
            }],
        };
        assert_eq!(snapshot.to_webvtt(), "WEBVTT\n\n1\n00:00:01.500 --> 00:00:02.250\nAnn: hi\n\n");
        assert_eq!(snapshot.to_srt(), "1\n00:00:01,500 --> 00:00:02,250\nAnn: hi\n\n");
        assert_eq!(snapshot.active_at(2.0).map(|c| c.index), Some(1));
        assert!(snapshot.active_at(2.25).is_none());
    }
}
