//! Kind-specific content at the document boundary.
//!
//! The runtime model always exposes `label` (scenes, highlights) or `text`
//! (dialogues, captions), whatever the backend named the field.

use serde_json::{Map, Value};

use super::shape::FieldNotes;
use crate::model::capability::TrackKind;
use crate::model::entry::Content;

struct TextField {
    runtime: &'static str,
    aliases: &'static [&'static str],
    default_wire: &'static str,
}

fn text_field(kind: TrackKind) -> TextField {
    match kind {
        TrackKind::Scenes => TextField {
            runtime: "label",
            aliases: &["title"],
            default_wire: "label",
        },
        TrackKind::Highlights => TextField {
            runtime: "label",
            aliases: &[],
            default_wire: "label",
        },
        TrackKind::Dialogues => TextField {
            runtime: "text",
            aliases: &["content"],
            default_wire: "text",
        },
        TrackKind::Captions => TextField {
            runtime: "text",
            aliases: &["content"],
            default_wire: "content",
        },
    }
}

/// Typed view of an entry's content, used where the engine needs to read
/// kind-specific fields (cues, merge checks).
#[derive(Clone, PartialEq, Debug)]
pub enum KindContent {
    Scene {
        label: String,
    },
    Highlight {
        label: String,
        highlight_type: Option<String>,
    },
    Dialogue {
        text: String,
        speaker: Option<String>,
    },
    Caption {
        text: String,
        category: Option<String>,
    },
}

impl KindContent {
    pub fn view(kind: TrackKind, content: &Content) -> Self {
        let string = |key: &str| content.get_str(key).map(str::to_string);
        match kind {
            TrackKind::Scenes => KindContent::Scene {
                label: string("label").unwrap_or_default(),
            },
            TrackKind::Highlights => KindContent::Highlight {
                label: string("label").unwrap_or_default(),
                highlight_type: string("type"),
            },
            TrackKind::Dialogues => KindContent::Dialogue {
                text: string("text").unwrap_or_default(),
                speaker: string("speaker"),
            },
            TrackKind::Captions => KindContent::Caption {
                text: string("text").unwrap_or_default(),
                category: string("category"),
            },
        }
    }

    pub fn text(&self) -> &str {
        match self {
            KindContent::Scene { label } | KindContent::Highlight { label, .. } => label,
            KindContent::Dialogue { text, .. } | KindContent::Caption { text, .. } => text,
        }
    }
}

/// Wire content record → runtime content.
pub(crate) fn decode(kind: TrackKind, mut map: Map<String, Value>, unknown_speaker: &str) -> (Content, FieldNotes) {
    let rule = text_field(kind);
    let mut notes = FieldNotes::default();

    if map.contains_key(rule.runtime) {
        if rule.runtime != rule.default_wire {
            notes.text_wire_key = Some(rule.runtime.to_string());
        }
    } else if let Some(alias) = rule
        .aliases
        .iter()
        .find(|alias| map.get(**alias).is_some_and(Value::is_string))
    {
        if let Some(value) = map.remove(*alias) {
            map.insert(rule.runtime.to_string(), value);
        }
        if *alias != rule.default_wire {
            notes.text_wire_key = Some(alias.to_string());
        }
    } else {
        let fallback = match kind {
            TrackKind::Scenes => Value::from("Untitled"),
            TrackKind::Highlights => map
                .get("type")
                .filter(|v| v.is_string())
                .cloned()
                .unwrap_or_else(|| Value::from("Highlight")),
            TrackKind::Dialogues | TrackKind::Captions => Value::from(""),
        };
        map.insert(rule.runtime.to_string(), fallback.clone());
        notes.synthesized.insert(rule.runtime.to_string(), fallback);
    }

    if kind == TrackKind::Dialogues && !map.contains_key("speaker") {
        let speaker = Value::from(unknown_speaker);
        map.insert("speaker".to_string(), speaker.clone());
        notes.synthesized.insert("speaker".to_string(), speaker);
    }

    (Content::from(map), notes)
}

/// Runtime content → wire content record.
pub(crate) fn encode(kind: TrackKind, content: &Content, notes: &FieldNotes) -> Map<String, Value> {
    let rule = text_field(kind);
    let mut map = content.as_map().clone();

    for (key, value) in &notes.synthesized {
        if map.get(key) == Some(value) {
            map.remove(key);
        }
    }

    let wire_key = notes.text_wire_key.as_deref().unwrap_or(rule.default_wire);
    if wire_key != rule.runtime {
        if let Some(value) = map.remove(rule.runtime) {
            map.insert(wire_key.to_string(), value);
        }
    }

    // A default label left unedited is not written as a type.
    let label_synthesized = notes
        .synthesized
        .get("label")
        .is_some_and(|value| content.get("label") == Some(value));
    if kind == TrackKind::Highlights && !label_synthesized && !map.contains_key("type") {
        if let Some(label) = content.get("label") {
            map.insert("type".to_string(), label.clone());
        }
    }

    map
}
