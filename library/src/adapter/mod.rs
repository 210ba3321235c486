//! Persistence adapter: backend annotation document ⇄ runtime `Timeline`.
//!
//! Inbound flattens each item's `content`/`context` records into one entry and
//! normalizes kind-specific field names. Outbound re-partitions the fields and
//! restores the names. For a well-formed document the two are inverse, apart
//! from the refreshed `updated_at`.

mod item;
pub mod kind_content;
pub mod shape;

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::capability::TrackKind;
use crate::model::timeline::Timeline;

pub use kind_content::KindContent;
pub use shape::Layout;

pub const UPDATED_AT_KEY: &str = "updated_at";

/// Everything in the document that is not an entry.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DocumentMeta {
    rest: Map<String, Value>,
    absent_tracks: Vec<TrackKind>,
    layouts: HashMap<TrackKind, Layout>,
}

impl DocumentMeta {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.rest.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.rest.get(key).and_then(Value::as_str)
    }

    pub fn media_id(&self) -> Option<&str> {
        self.get_str("media_id")
    }

    /// Media duration in seconds, when the document records one.
    pub fn duration(&self) -> Option<f64> {
        self.rest.get("duration").and_then(Value::as_f64)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.get_str(UPDATED_AT_KEY)
    }

    /// Layout new entries on `kind` are written in: whatever the document
    /// already used for that track, nested otherwise.
    pub fn layout_for(&self, kind: TrackKind) -> Layout {
        self.layouts.get(&kind).copied().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub timeline: Timeline,
    pub meta: DocumentMeta,
}

pub struct DocumentAdapter;

impl DocumentAdapter {
    pub fn inbound_str(json_str: &str, config: &EngineConfig) -> Result<LoadedDocument, EngineError> {
        let doc: Value = serde_json::from_str(json_str)?;
        Self::inbound(&doc, config)
    }

    pub fn inbound(doc: &Value, config: &EngineConfig) -> Result<LoadedDocument, EngineError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| EngineError::document("annotation document must be a JSON object"))?;

        let mut timeline = Timeline::new(config);
        let mut meta = DocumentMeta::default();

        for (key, value) in obj {
            if TrackKind::parse(key).is_none() {
                meta.rest.insert(key.clone(), value.clone());
            }
        }

        for kind in TrackKind::ALL {
            match obj.get(kind.as_str()) {
                Some(Value::Array(items)) => {
                    for item in items {
                        if let Some(entry) = item::decode_item(kind, item, config) {
                            if let Some(shape) = &entry.wire {
                                meta.layouts.entry(kind).or_insert(shape.layout);
                            }
                            timeline.insert_entry(kind, entry);
                        }
                    }
                }
                Some(other) => {
                    warn!("`{}` is not an array; leaving it untouched", kind);
                    meta.rest.insert(kind.as_str().to_string(), other.clone());
                    meta.absent_tracks.push(kind);
                }
                None => meta.absent_tracks.push(kind),
            }
        }

        info!(
            "[Adapter] Loaded {} scenes, {} highlights, {} dialogues, {} captions",
            timeline.track(TrackKind::Scenes).len(),
            timeline.track(TrackKind::Highlights).len(),
            timeline.track(TrackKind::Dialogues).len(),
            timeline.track(TrackKind::Captions).len(),
        );

        Ok(LoadedDocument { timeline, meta })
    }

    /// Builds the document to persist, stamped with the current time.
    pub fn outbound(timeline: &Timeline, meta: &DocumentMeta) -> Value {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        Self::outbound_at(timeline, meta, &now)
    }

    pub fn outbound_at(timeline: &Timeline, meta: &DocumentMeta, updated_at: &str) -> Value {
        let mut obj = meta.rest.clone();
        for kind in TrackKind::ALL {
            let track = timeline.track(kind);
            if track.is_empty() && meta.absent_tracks.contains(&kind) {
                continue;
            }
            let layout = meta.layout_for(kind);
            let items: Vec<Value> = timeline
                .entries(kind)
                .map(|entry| item::encode_item(kind, entry, layout))
                .collect();
            obj.insert(kind.as_str().to_string(), Value::Array(items));
        }
        obj.insert(UPDATED_AT_KEY.to_string(), Value::from(updated_at));
        Value::Object(obj)
    }

    pub fn outbound_string(timeline: &Timeline, meta: &DocumentMeta) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&Self::outbound(timeline, meta))?)
    }
}
