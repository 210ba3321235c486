use serde_json::{Map, Number, Value};

/// How an item was written in the backend document.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Layout {
    /// `{id, start, end, ...content fields, ...provenance fields}`
    Flat,
    /// `{start, end, content: {...}, context: {id, origin, is_verified, ...}}`
    #[default]
    Nested,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IdPlacement {
    Top,
    Context,
    Both,
}

impl IdPlacement {
    pub fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::Flat => IdPlacement::Top,
            Layout::Nested => IdPlacement::Context,
        }
    }

    pub fn at_top(&self) -> bool {
        matches!(self, IdPlacement::Top | IdPlacement::Both)
    }

    pub fn in_context(&self) -> bool {
        matches!(self, IdPlacement::Context | IdPlacement::Both)
    }
}

/// Kind-specific field bookkeeping between wire and runtime names.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct FieldNotes {
    /// Wire key of the uniform text/label field when it differs from the
    /// kind's default wire key.
    pub text_wire_key: Option<String>,
    /// Values filled in on load because the document lacked them.
    pub synthesized: Map<String, Value>,
}

/// Per-entry memory of the original wire shape, so an untouched entry is
/// written back exactly as it was read.
#[derive(Clone, PartialEq, Debug)]
pub struct WireShape {
    pub layout: Layout,
    pub id_placement: IdPlacement,
    pub id_raw: Option<Value>,
    pub has_context: bool,
    /// Nested layout only: top-level keys besides start/end/id/content/context.
    pub top_extra: Map<String, Value>,
    pub start_raw: Option<Number>,
    pub end_raw: Option<Number>,
    pub origin_explicit: bool,
    pub verified_explicit: bool,
    pub fields: FieldNotes,
}

impl WireShape {
    /// Shape used for entries created in the editor.
    pub fn fresh(layout: Layout) -> Self {
        Self {
            layout,
            id_placement: IdPlacement::for_layout(layout),
            id_raw: None,
            has_context: layout == Layout::Nested,
            top_extra: Map::new(),
            start_raw: None,
            end_raw: None,
            origin_explicit: true,
            verified_explicit: true,
            fields: FieldNotes::default(),
        }
    }
}

/// Writes a time back in its original representation if it was not edited.
pub(crate) fn time_value(value: f64, raw: Option<&Number>) -> Value {
    if let Some(raw) = raw {
        if raw.as_f64() == Some(value) {
            return Value::Number(raw.clone());
        }
    }
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
