//! Per-track-kind capability table.
//!
//! This is the single place that decides whether a track kind may be
//! created on, moved, resized, split or merged. Everything else asks here.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::entry::Content;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Scenes,
    Highlights,
    Dialogues,
    Captions,
}

impl TrackKind {
    pub const ALL: [TrackKind; 4] = [
        TrackKind::Scenes,
        TrackKind::Highlights,
        TrackKind::Dialogues,
        TrackKind::Captions,
    ];

    /// Key of this track's array in the persisted document.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Scenes => "scenes",
            TrackKind::Highlights => "highlights",
            TrackKind::Dialogues => "dialogues",
            TrackKind::Captions => "captions",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        TrackKind::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn definition(&self) -> &'static TrackDefinition {
        match self {
            TrackKind::Scenes => &TRACK_DEFINITIONS[0],
            TrackKind::Highlights => &TRACK_DEFINITIONS[1],
            TrackKind::Dialogues => &TRACK_DEFINITIONS[2],
            TrackKind::Captions => &TRACK_DEFINITIONS[3],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.definition().capabilities.allows(capability)
    }

    /// Tracks whose entries carry a `text` field joined on merge and spoken in cues.
    pub fn is_text_bearing(&self) -> bool {
        matches!(self, TrackKind::Dialogues | TrackKind::Captions)
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Create,
    Move,
    Resize,
    Split,
    Merge,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Create => "create",
            Capability::Move => "move",
            Capability::Resize => "resize",
            Capability::Split => "split",
            Capability::Merge => "merge",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CapabilitySet {
    pub create: bool,
    pub move_: bool,
    pub resize: bool,
    pub split: bool,
    pub merge: bool,
}

impl CapabilitySet {
    const SEMANTIC: CapabilitySet = CapabilitySet {
        create: true,
        move_: true,
        resize: true,
        split: false,
        merge: false,
    };

    const TRANSCRIPT: CapabilitySet = CapabilitySet {
        create: true,
        move_: true,
        resize: true,
        split: true,
        merge: true,
    };

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Create => self.create,
            Capability::Move => self.move_,
            Capability::Resize => self.resize,
            Capability::Split => self.split,
            Capability::Merge => self.merge,
        }
    }
}

pub struct TrackDefinition {
    pub kind: TrackKind,
    pub name: &'static str,
    pub color: &'static str,
    pub capabilities: CapabilitySet,
    /// Content key that must be equal on both sides of a merge.
    pub merge_requires_equal: Option<&'static str>,
    factory: fn() -> Value,
}

impl TrackDefinition {
    /// Default content for an entry created on this track.
    pub fn factory(&self) -> Content {
        match (self.factory)() {
            Value::Object(map) => Content::from(map),
            _ => Content::default(),
        }
    }
}

pub static TRACK_DEFINITIONS: [TrackDefinition; 4] = [
    TrackDefinition {
        kind: TrackKind::Scenes,
        name: "SCENES",
        color: "#d8b4fe",
        capabilities: CapabilitySet::SEMANTIC,
        merge_requires_equal: None,
        factory: || json!({ "label": "New Scene" }),
    },
    TrackDefinition {
        kind: TrackKind::Highlights,
        name: "HIGHLIGHTS",
        color: "#fcd34d",
        capabilities: CapabilitySet::SEMANTIC,
        merge_requires_equal: None,
        factory: || json!({ "label": "Action", "type": "Action", "description": "" }),
    },
    TrackDefinition {
        kind: TrackKind::Dialogues,
        name: "DIALOG",
        color: "#bae7ff",
        capabilities: CapabilitySet::TRANSCRIPT,
        merge_requires_equal: Some("speaker"),
        factory: || json!({ "text": "New Line", "speaker": "Unknown" }),
    },
    TrackDefinition {
        kind: TrackKind::Captions,
        name: "CAPTIONS",
        color: "#ffbb96",
        capabilities: CapabilitySet::TRANSCRIPT,
        merge_requires_equal: None,
        factory: || json!({ "text": "New Caption", "category": "General" }),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_tracks_cannot_split_or_merge() {
        for kind in [TrackKind::Scenes, TrackKind::Highlights] {
            assert!(kind.can(Capability::Create));
            assert!(kind.can(Capability::Move));
            assert!(kind.can(Capability::Resize));
            assert!(!kind.can(Capability::Split));
            assert!(!kind.can(Capability::Merge));
        }
    }

    #[test]
    fn transcript_tracks_allow_everything() {
        for kind in [TrackKind::Dialogues, TrackKind::Captions] {
            for cap in [
                Capability::Create,
                Capability::Move,
                Capability::Resize,
                Capability::Split,
                Capability::Merge,
            ] {
                assert!(kind.can(cap), "{kind} should allow {cap}");
            }
        }
    }

    #[test]
    fn definitions_are_indexed_by_kind() {
        for kind in TrackKind::ALL {
            assert_eq!(kind.definition().kind, kind);
            assert_eq!(TrackKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn factories_produce_kind_specific_content() {
        let dialogue = TrackKind::Dialogues.definition().factory();
        assert_eq!(dialogue.get_str("speaker"), Some("Unknown"));
        let highlight = TrackKind::Highlights.definition().factory();
        assert_eq!(highlight.get_str("type"), Some("Action"));
        assert_eq!(highlight.get_str("label"), Some("Action"));
    }
}
