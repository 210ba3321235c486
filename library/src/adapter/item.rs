use log::warn;
use serde_json::{Map, Number, Value};

use super::kind_content;
use super::shape::{IdPlacement, Layout, WireShape, time_value};
use crate::config::EngineConfig;
use crate::model::capability::TrackKind;
use crate::model::entry::{Entry, EntryId, Origin, Provenance};

/// Provenance keys lifted out of a flat item (and found in a nested `context`).
const PROVENANCE_FIELDS: [&str; 5] = ["origin", "is_verified", "modified_at", "ai_meta", "confidence"];

fn id_from_value(value: &Value) -> Option<EntryId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(EntryId::new(s)),
        Value::Number(n) => Some(EntryId::new(n.to_string())),
        _ => None,
    }
}

fn take_time(obj: &mut Map<String, Value>, key: &str) -> Option<(f64, Number)> {
    match obj.remove(key) {
        Some(Value::Number(n)) => n.as_f64().filter(|t| t.is_finite()).map(|t| (t, n)),
        Some(other) => {
            // Keep whatever was there so it is not lost on save.
            obj.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn decode_provenance(mut ctx: Map<String, Value>, shape: &mut WireShape) -> Provenance {
    let mut prov = Provenance::default();

    if let Some(Value::String(origin)) = ctx.get("origin") {
        prov.origin = Origin::parse(origin);
        shape.origin_explicit = true;
        ctx.remove("origin");
    }
    if let Some(Value::Bool(verified)) = ctx.get("is_verified") {
        prov.is_verified = *verified;
        shape.verified_explicit = true;
        ctx.remove("is_verified");
    }
    if let Some(Value::String(ts)) = ctx.get("modified_at") {
        prov.modified_at = Some(ts.clone());
        ctx.remove("modified_at");
    }
    prov.confidence = ctx
        .get("ai_meta")
        .and_then(|meta| meta.get("confidence"))
        .or_else(|| ctx.get("confidence"))
        .and_then(Value::as_f64);

    prov.extra = ctx;
    prov
}

fn encode_provenance(out: &mut Map<String, Value>, prov: &Provenance, shape: &WireShape) {
    for (key, value) in &prov.extra {
        if key == "confidence" && prov.confidence.is_none() {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }
    if shape.origin_explicit || prov.origin.is_machine() {
        out.insert("origin".to_string(), Value::from(prov.origin.as_str()));
    }
    if shape.verified_explicit || prov.is_verified {
        out.insert("is_verified".to_string(), Value::Bool(prov.is_verified));
    }
    if let Some(ts) = &prov.modified_at {
        out.insert("modified_at".to_string(), Value::from(ts.as_str()));
    }
}

/// Flattens one document item into an entry. Returns `None` only for
/// elements that are not objects.
pub(crate) fn decode_item(kind: TrackKind, value: &Value, config: &EngineConfig) -> Option<Entry> {
    let Some(obj) = value.as_object() else {
        warn!("Skipping non-object element on {} track", kind);
        return None;
    };
    let mut obj = obj.clone();

    let layout = match obj.get("content") {
        Some(Value::Object(_)) => Layout::Nested,
        _ => Layout::Flat,
    };

    let start = take_time(&mut obj, "start");
    let end = take_time(&mut obj, "end");
    let top_id = obj.remove("id");

    let (content_map, ctx, has_context) = match layout {
        Layout::Nested => {
            let content = match obj.remove("content") {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            let (ctx, has_context) = match obj.remove("context") {
                Some(Value::Object(map)) => (map, true),
                Some(other) => {
                    obj.insert("context".to_string(), other);
                    (Map::new(), false)
                }
                None => (Map::new(), false),
            };
            (content, ctx, has_context)
        }
        Layout::Flat => {
            let mut ctx = Map::new();
            for key in PROVENANCE_FIELDS {
                if let Some(v) = obj.remove(key) {
                    ctx.insert(key.to_string(), v);
                }
            }
            (std::mem::take(&mut obj), ctx, false)
        }
    };

    let mut ctx = ctx;
    let ctx_id = if layout == Layout::Nested { ctx.remove("id") } else { None };

    let parsed_top = top_id.as_ref().and_then(id_from_value);
    let parsed_ctx = ctx_id.as_ref().and_then(id_from_value);
    let (id, id_placement, id_raw) = match (parsed_top, parsed_ctx) {
        (Some(top), Some(_)) => (top, IdPlacement::Both, top_id.clone()),
        (Some(top), None) => (top, IdPlacement::Top, top_id.clone()),
        (None, Some(ctx)) => (ctx, IdPlacement::Context, ctx_id.clone()),
        (None, None) => {
            let fresh = EntryId::generate();
            warn!("Element on {} track has no id; assigned {}", kind, fresh);
            (fresh, IdPlacement::for_layout(layout), None)
        }
    };
    // An unusable id value is kept in place rather than dropped.
    if id_placement == IdPlacement::Context {
        if let Some(raw) = top_id.filter(|v| id_from_value(v).is_none()) {
            obj.insert("id".to_string(), raw);
        }
    }

    let (start_t, start_raw) = match start {
        Some((t, raw)) => (t, Some(raw)),
        None => {
            warn!("Entry {} on {} track has no start; using 0", id, kind);
            (0.0, None)
        }
    };
    let (end_t, end_raw) = match end {
        Some((t, raw)) => (t, Some(raw)),
        None => {
            warn!("Entry {} on {} track has no end; using minimum duration", id, kind);
            (start_t + config.min_duration, None)
        }
    };

    let (content, fields) = kind_content::decode(kind, content_map, &config.unknown_speaker);

    let mut shape = WireShape {
        layout,
        id_placement,
        id_raw,
        has_context,
        top_extra: if layout == Layout::Nested { obj } else { Map::new() },
        start_raw,
        end_raw,
        origin_explicit: false,
        verified_explicit: false,
        fields,
    };
    let provenance = decode_provenance(ctx, &mut shape);

    let mut entry = Entry::new(id, start_t, end_t, content, provenance);
    entry.wire = Some(shape);
    Some(entry)
}

fn id_value(id: &EntryId, raw: Option<&Value>) -> Value {
    match raw {
        Some(raw) if id_from_value(raw).as_ref() == Some(id) => raw.clone(),
        _ => Value::from(id.as_str()),
    }
}

/// Inverse of `decode_item`.
pub(crate) fn encode_item(kind: TrackKind, entry: &Entry, default_layout: Layout) -> Value {
    let fresh;
    let shape = match &entry.wire {
        Some(shape) => shape,
        None => {
            fresh = WireShape::fresh(default_layout);
            &fresh
        }
    };

    let content = kind_content::encode(kind, &entry.content, &shape.fields);
    let id = id_value(&entry.id, shape.id_raw.as_ref());
    let start = time_value(entry.start, shape.start_raw.as_ref());
    let end = time_value(entry.end, shape.end_raw.as_ref());

    let mut out = match shape.layout {
        Layout::Nested => {
            let mut out = shape.top_extra.clone();
            out.insert("content".to_string(), Value::Object(content));
            let mut ctx = Map::new();
            if shape.id_placement.in_context() {
                ctx.insert("id".to_string(), id.clone());
            }
            encode_provenance(&mut ctx, &entry.provenance, shape);
            if shape.has_context || !ctx.is_empty() {
                out.insert("context".to_string(), Value::Object(ctx));
            }
            out
        }
        Layout::Flat => {
            let mut out = content;
            encode_provenance(&mut out, &entry.provenance, shape);
            out
        }
    };

    if shape.id_placement.at_top() {
        out.insert("id".to_string(), id);
    }
    out.insert("start".to_string(), start);
    out.insert("end".to_string(), end);
    Value::Object(out)
}
