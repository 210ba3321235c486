use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::adapter::shape::WireShape;

/// Opaque entry identifier, unique across the whole document.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[serde(transparent)]
pub struct EntryId(Arc<str>);

impl EntryId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Origin {
    #[default]
    Human,
    AiAsr,
    AiLlm,
    AiCv,
    AiOcr,
    /// An origin this build does not know; kept verbatim.
    Other(String),
}

impl Origin {
    pub fn parse(s: &str) -> Self {
        match s {
            "human" => Origin::Human,
            "ai_asr" => Origin::AiAsr,
            "ai_llm" => Origin::AiLlm,
            "ai_cv" => Origin::AiCv,
            "ai_ocr" => Origin::AiOcr,
            other => Origin::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Origin::Human => "human",
            Origin::AiAsr => "ai_asr",
            Origin::AiLlm => "ai_llm",
            Origin::AiCv => "ai_cv",
            Origin::AiOcr => "ai_ocr",
            Origin::Other(s) => s,
        }
    }

    pub fn is_machine(&self) -> bool {
        !matches!(self, Origin::Human)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Provenance {
    pub origin: Origin,
    pub is_verified: bool,
    /// Only meaningful for machine origins.
    pub confidence: Option<f64>,
    /// ISO-8601, kept as written by the backend.
    pub modified_at: Option<String>,
    /// Context fields the engine does not interpret (`ai_meta`, ...).
    pub extra: Map<String, Value>,
}

impl Provenance {
    pub fn human() -> Self {
        Self {
            origin: Origin::Human,
            is_verified: true,
            confidence: None,
            modified_at: Some(now_timestamp()),
            extra: Map::new(),
        }
    }

    pub fn machine(origin: Origin, confidence: Option<f64>) -> Self {
        Self {
            origin,
            is_verified: false,
            confidence,
            modified_at: None,
            extra: Map::new(),
        }
    }

    /// A human changed the entry: it is no longer an unreviewed guess.
    pub fn mark_human(&mut self) {
        self.origin = Origin::Human;
        self.is_verified = true;
        self.confidence = None;
        self.touch();
    }

    /// A human reviewed the entry and kept it as it is.
    pub fn accept(&mut self) {
        self.is_verified = true;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.modified_at = Some(now_timestamp());
    }

    pub fn modified_at_utc(&self) -> Option<DateTime<Utc>> {
        self.modified_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Kind-specific content fields, kept as an open map so unknown keys survive.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(transparent)]
pub struct Content(Map<String, Value>);

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Content {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Entry {
    pub id: EntryId,
    pub start: f64,
    pub end: f64,
    pub content: Content,
    pub provenance: Provenance,
    /// How the entry was laid out in the document it was loaded from.
    pub(crate) wire: Option<WireShape>,
}

impl Entry {
    pub fn new(id: EntryId, start: f64, end: f64, content: Content, provenance: Provenance) -> Self {
        Self {
            id,
            start,
            end,
            content,
            provenance,
            wire: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn text(&self) -> Option<&str> {
        self.content.get_str("text")
    }

    pub fn label(&self) -> Option<&str> {
        self.content.get_str("label")
    }

    /// Text shown on the clip: label for semantic tracks, text for transcripts.
    pub fn display_text(&self) -> &str {
        self.label().or_else(|| self.text()).unwrap_or("")
    }

    /// Same annotation under a new id, for splitting.
    pub(crate) fn duplicate(&self, id: EntryId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

/// Partial update for `Timeline::update_entry`.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct EntryPatch {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub set: Map<String, Value>,
    pub remove: Vec<String>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn range(self, start: f64, end: f64) -> Self {
        self.start(start).end(end)
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(key.into(), value.into());
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.remove.push(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.set.is_empty() && self.remove.is_empty()
    }
}
