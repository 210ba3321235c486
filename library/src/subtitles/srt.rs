//! SRT transcripts as a source of machine-made dialogue entries.

use log::{debug, info};

use crate::config::EngineConfig;
use crate::model::capability::TrackKind;
use crate::model::entry::{Content, Entry, EntryId, Origin, Provenance};
use crate::model::timeline::{RangeAnchor, Timeline};

const SPEAKER_SEPARATORS: [char; 2] = [':', '：'];

#[derive(Clone, PartialEq, Debug)]
pub struct SrtCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker: String,
    /// Cue text as written, speaker prefix included.
    pub original_text: String,
}

/// `HH:MM:SS,mmm` (or `.mmm`) to seconds. Anything malformed reads as 0.
pub fn parse_timestamp(s: &str) -> f64 {
    let normalized = s.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    let [h, m, sec] = parts.as_slice() else {
        return 0.0;
    };
    match (h.parse::<f64>(), m.parse::<f64>(), sec.parse::<f64>()) {
        (Ok(h), Ok(m), Ok(sec)) => h * 3600.0 + m * 60.0 + sec,
        _ => 0.0,
    }
}

fn split_speaker(full_text: &str, unknown_speaker: &str) -> (String, String) {
    match full_text.split_once(&SPEAKER_SEPARATORS[..]) {
        Some((speaker, text)) => (speaker.trim().to_string(), text.trim().to_string()),
        None => (unknown_speaker.to_string(), full_text.to_string()),
    }
}

/// Parses SRT text. Blocks without a timing line or with fewer than three
/// lines are skipped.
pub fn parse_srt(content: &str, unknown_speaker: &str) -> Vec<SrtCue> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut cues = Vec::new();

    for block in normalized.trim().split("\n\n") {
        let lines: Vec<&str> = block.trim().split('\n').collect();
        if lines.len() < 3 {
            continue;
        }
        let Some(timing_index) = [1, 0].into_iter().find(|&i| lines[i].contains("-->")) else {
            debug!("SRT block without timing line skipped");
            continue;
        };
        let Some((start, end)) = lines[timing_index].split_once(" --> ") else {
            continue;
        };

        let full_text = lines[timing_index + 1..].join("\n");
        let (speaker, text) = split_speaker(&full_text, unknown_speaker);
        cues.push(SrtCue {
            start: parse_timestamp(start),
            end: parse_timestamp(end),
            text,
            speaker,
            original_text: full_text,
        });
    }
    cues
}

/// Appends the cues of an SRT transcript to the dialogue track as
/// unreviewed speech-recognition output.
pub fn ingest_srt(timeline: &mut Timeline, content: &str, config: &EngineConfig) -> Vec<EntryId> {
    let ids: Vec<EntryId> = parse_srt(content, &config.unknown_speaker)
        .into_iter()
        .map(|cue| {
            let (start, end) = timeline.clamp_range(cue.start, cue.end, RangeAnchor::Start);
            let mut fields = Content::new();
            fields.set("text", cue.text);
            fields.set("speaker", cue.speaker);
            fields.set("original_text", cue.original_text);
            let entry = Entry::new(
                EntryId::generate(),
                start,
                end,
                fields,
                Provenance::machine(Origin::AiAsr, None),
            );
            timeline.insert_entry(TrackKind::Dialogues, entry)
        })
        .collect();
    info!("Ingested {} dialogue lines from SRT", ids.len());
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\r\n00:00:01,000 --> 00:00:03,500\r\nAnn: Hello there\r\n\r\n\
2\r\n00:00:04,000 --> 00:00:05,000\r\nno speaker here\r\n\r\n\
3\r\n00:00:06.000 --> 00:00:07.250\r\n小明：你好\r\n\r\n\
broken block\r\n";

    #[test]
    fn parses_blocks_and_speakers() {
        let cues = parse_srt(SAMPLE, "Unknown");
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].start, 1.0);
        assert_eq!(cues[0].end, 3.5);
        assert_eq!(cues[0].speaker, "Ann");
        assert_eq!(cues[0].text, "Hello there");
        assert_eq!(cues[0].original_text, "Ann: Hello there");
        assert_eq!(cues[1].speaker, "Unknown");
        assert_eq!(cues[1].text, "no speaker here");
        assert_eq!(cues[2].speaker, "小明");
        assert_eq!(cues[2].text, "你好");
        assert_eq!(cues[2].end, 7.25);
    }

    #[test]
    fn speaker_ends_at_the_first_separator() {
        assert_eq!(
            split_speaker("小明：时间是10:30", "Unknown"),
            ("小明".to_string(), "时间是10:30".to_string())
        );
        assert_eq!(
            split_speaker("Ann: meet at 10：30", "Unknown"),
            ("Ann".to_string(), "meet at 10：30".to_string())
        );
        assert_eq!(split_speaker("No speaker", "Unknown"), ("Unknown".to_string(), "No speaker".to_string()));
    }

    #[test]
    fn timing_line_may_come_first() {
        let cues = parse_srt("00:00:01,000 --> 00:00:02,000\nline one\nline two", "Unknown");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "line one\nline two");
    }

    #[test]
    fn malformed_time_reads_as_zero() {
        assert_eq!(parse_timestamp("xx:00:01,000"), 0.0);
        assert_eq!(parse_timestamp("00:01"), 0.0);
        assert_eq!(parse_timestamp("01:00:00,500"), 3600.5);
    }
}
