//! Integration tests for splitting and merging the selected entry.

use annotation_engine::adapter::DocumentAdapter;
use annotation_engine::editor::{EditorSession, InteractionController, SplitMergeOperator};
use annotation_engine::media::ManualClock;
use annotation_engine::model::{Capability, EntryId, Origin, Timeline, TrackKind};
use annotation_engine::{EngineConfig, Rejection};
use assert_matches::assert_matches;
use serde_json::{Value, json};

const STAMP: &str = "2024-01-01T00:00:00Z";

fn dialogue(id: &str, start: f64, end: f64, speaker: &str, text: &str) -> Value {
    json!({
        "start": start, "end": end,
        "content": { "text": text, "speaker": speaker },
        "context": { "id": id, "origin": "ai_asr", "is_verified": false,
                     "ai_meta": { "confidence": 0.8 } }
    })
}

fn load(doc: &Value) -> (Timeline, InteractionController, SplitMergeOperator) {
    let config = EngineConfig::default();
    let loaded = DocumentAdapter::inbound(doc, &config).unwrap();
    (
        loaded.timeline,
        InteractionController::new(&config),
        SplitMergeOperator::new(&config),
    )
}

fn snapshot(tl: &Timeline) -> Value {
    let config = EngineConfig::default();
    let meta = DocumentAdapter::inbound(&json!({}), &config).unwrap().meta;
    DocumentAdapter::outbound_at(tl, &meta, STAMP)
}

#[test]
fn test_split_fidelity() {
    let doc = json!({ "dialogues": [dialogue("d-1", 10.0, 20.0, "Ann", "hello world")] });
    let (mut tl, mut ctl, op) = load(&doc);
    let id = EntryId::from("d-1");
    ctl.select(Some(id.clone()));

    let tail_id = op.split(&mut tl, &mut ctl, 15.0).unwrap();
    assert_ne!(tail_id, id);
    assert_eq!(ctl.selected(), Some(&tail_id));

    let head = tl.entry(&id).unwrap();
    let tail = tl.entry(&tail_id).unwrap();
    assert_eq!((head.start, head.end), (10.0, 15.0));
    assert_eq!((tail.start, tail.end), (15.0, 20.0));
    for entry in [head, tail] {
        assert_eq!(entry.text(), Some("hello world"));
        assert_eq!(entry.content.get_str("speaker"), Some("Ann"));
        assert_eq!(entry.provenance.origin, Origin::Human);
        assert!(entry.provenance.is_verified);
    }
    // The halves stay adjacent in storage order.
    let order: Vec<&str> = tl
        .track(TrackKind::Dialogues)
        .entry_ids()
        .iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(order, vec!["d-1", tail_id.as_str()]);
}

#[test]
fn test_split_near_edges_is_refused() {
    let doc = json!({ "dialogues": [dialogue("d-1", 10.0, 20.0, "Ann", "hi")] });
    let (mut tl, mut ctl, op) = load(&doc);
    ctl.select(Some(EntryId::from("d-1")));
    let before = snapshot(&tl);

    for t in [10.0, 10.05, 19.95, 20.0, 25.0, f64::NAN] {
        assert_matches!(op.split(&mut tl, &mut ctl, t), Err(Rejection::SplitAtEdge { .. }));
    }
    assert_eq!(snapshot(&tl), before);
    assert_eq!(tl.entry_count(), 1);
}

#[test]
fn test_split_is_gated_by_capability() {
    let doc = json!({ "scenes": [{ "id": "s-1", "start": 0, "end": 30, "label": "Opening" }] });
    let (mut tl, mut ctl, op) = load(&doc);
    ctl.select(Some(EntryId::from("s-1")));
    let before = snapshot(&tl);

    assert_matches!(
        op.split(&mut tl, &mut ctl, 15.0),
        Err(Rejection::CapabilityDenied {
            kind: TrackKind::Scenes,
            capability: Capability::Split
        })
    );
    assert_matches!(
        op.merge(&mut tl, &mut ctl),
        Err(Rejection::CapabilityDenied {
            capability: Capability::Merge,
            ..
        })
    );
    assert_eq!(snapshot(&tl), before);
}

#[test]
fn test_split_needs_selection_and_idle_controller() {
    let doc = json!({ "captions": [{ "id": "c-1", "start": 0, "end": 4, "content": "x" }] });
    let (mut tl, mut ctl, op) = load(&doc);
    assert_matches!(op.split(&mut tl, &mut ctl, 2.0), Err(Rejection::NoSelection));

    let config = EngineConfig::default();
    let geometry = annotation_engine::TimelineGeometry::new(&config);
    ctl.pointer_down(&tl, &geometry, 40.0, 146.0).unwrap();
    assert_matches!(op.split(&mut tl, &mut ctl, 2.0), Err(Rejection::GestureInProgress));
    assert_matches!(op.merge(&mut tl, &mut ctl), Err(Rejection::GestureInProgress));
}

#[test]
fn test_merge_fidelity() {
    let doc = json!({ "dialogues": [
        dialogue("d-2", 5.0, 9.0, "A", "there"),
        dialogue("d-1", 0.0, 5.0, "A", "Hi"),
    ]});
    let (mut tl, mut ctl, op) = load(&doc);
    let id = EntryId::from("d-1");
    ctl.select(Some(id.clone()));

    assert_eq!(op.merge(&mut tl, &mut ctl).unwrap(), id);
    assert_eq!(tl.entry_count(), 1);
    assert!(tl.entry(&EntryId::from("d-2")).is_none());

    let merged = tl.entry(&id).unwrap();
    assert_eq!((merged.start, merged.end), (0.0, 9.0));
    assert_eq!(merged.text(), Some("Hi there"));
    assert_eq!(merged.content.get_str("speaker"), Some("A"));
    assert_eq!(merged.provenance.origin, Origin::Human);
    assert!(merged.provenance.is_verified);
    assert_eq!(ctl.selected(), Some(&id));
}

#[test]
fn test_merge_skips_empty_text() {
    let doc = json!({ "captions": [
        { "id": "c-1", "start": 0, "end": 2, "content": "" },
        { "id": "c-2", "start": 2, "end": 3, "content": "Night" }
    ]});
    let (mut tl, mut ctl, op) = load(&doc);
    ctl.select(Some(EntryId::from("c-1")));
    op.merge(&mut tl, &mut ctl).unwrap();
    assert_eq!(tl.entry(&EntryId::from("c-1")).unwrap().text(), Some("Night"));
}

#[test]
fn test_merge_speaker_mismatch_changes_nothing() {
    let doc = json!({ "dialogues": [
        dialogue("d-1", 0.0, 5.0, "A", "Hi"),
        dialogue("d-2", 5.0, 9.0, "B", "there"),
    ]});
    let (mut tl, mut ctl, op) = load(&doc);
    ctl.select(Some(EntryId::from("d-1")));
    let before = snapshot(&tl);

    let err = op.merge(&mut tl, &mut ctl).unwrap_err();
    assert_eq!(
        err,
        Rejection::SpeakerMismatch {
            left: "A".to_string(),
            right: "B".to_string()
        }
    );
    assert_eq!(snapshot(&tl), before);
    let first = tl.entry(&EntryId::from("d-1")).unwrap();
    assert_eq!(first.provenance.origin, Origin::AiAsr);
}

#[test]
fn test_merge_without_successor_is_refused() {
    let doc = json!({ "dialogues": [
        dialogue("d-1", 0.0, 5.0, "A", "Hi"),
        dialogue("d-2", 5.0, 9.0, "A", "there"),
    ]});
    let (mut tl, mut ctl, op) = load(&doc);
    ctl.select(Some(EntryId::from("d-2")));
    assert_matches!(op.merge(&mut tl, &mut ctl), Err(Rejection::NoSuccessor));
    assert_eq!(tl.entry_count(), 2);
}

#[test]
fn test_session_splits_at_playhead() {
    let doc = json!({ "dialogues": [dialogue("d-1", 10.0, 20.0, "Ann", "hello world")] });
    let mut session = EditorSession::from_document(EngineConfig::default(), &doc).unwrap();
    session.select(Some(EntryId::from("d-1")));

    let mut clock = ManualClock::at(12.5);
    assert!(session.handle_key("KeyS", &mut clock));
    assert_eq!(session.timeline().entry_count(), 2);
    let tail = session.selected_entry().unwrap();
    assert_eq!((tail.start, tail.end), (12.5, 20.0));

    // Merging the tail has nothing after it.
    session.take_notices();
    assert!(session.handle_key("KeyM", &mut clock));
    assert_eq!(session.take_notices().len(), 1);
    assert_eq!(session.timeline().entry_count(), 2);
}
