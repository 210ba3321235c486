//! Integration tests for the annotation model: provenance, minimum duration
//! and capability gating.

use annotation_engine::adapter::DocumentAdapter;
use annotation_engine::editor::EditorSession;
use annotation_engine::model::{Capability, EntryId, EntryPatch, Origin, Timeline, TrackKind};
use annotation_engine::{EngineConfig, Rejection};
use assert_matches::assert_matches;
use serde_json::json;

// 20 px per second; row centres for scenes, highlights, dialogues, captions.
const ROW_Y: [f32; 4] = [20.0, 62.0, 104.0, 146.0];

fn machine_timeline() -> Timeline {
    let doc = json!({
        "dialogues": [{
            "start": 2.0, "end": 4.0,
            "content": { "text": "guess", "speaker": "Ann" },
            "context": { "id": "d-1", "origin": "ai_asr", "is_verified": false,
                         "ai_meta": { "confidence": 0.6 } }
        }]
    });
    DocumentAdapter::inbound(&doc, &EngineConfig::default())
        .unwrap()
        .timeline
}

#[test]
fn test_time_edit_hands_entry_to_human() {
    let mut tl = machine_timeline();
    let id = EntryId::from("d-1");
    assert!(tl.update_entry(&id, &EntryPatch::new().start(2.5)).unwrap());

    let entry = tl.entry(&id).unwrap();
    assert_eq!(entry.start, 2.5);
    assert_eq!(entry.provenance.origin, Origin::Human);
    assert!(entry.provenance.is_verified);
    assert_eq!(entry.provenance.confidence, None);
}

#[test]
fn test_content_edit_hands_entry_to_human() {
    let mut tl = machine_timeline();
    let id = EntryId::from("d-1");
    assert!(tl.update_entry(&id, &EntryPatch::new().set("text", "fixed")).unwrap());
    let entry = tl.entry(&id).unwrap();
    assert_eq!(entry.text(), Some("fixed"));
    assert_eq!(entry.provenance.origin, Origin::Human);
    assert!(entry.provenance.is_verified);
}

#[test]
fn test_noop_edit_keeps_machine_provenance() {
    let mut tl = machine_timeline();
    let id = EntryId::from("d-1");
    assert!(!tl.update_entry(&id, &EntryPatch::new().set("text", "guess").range(2.0, 4.0)).unwrap());
    let entry = tl.entry(&id).unwrap();
    assert_eq!(entry.provenance.origin, Origin::AiAsr);
    assert!(!entry.provenance.is_verified);
}

#[test]
fn test_accept_verifies_without_changing_origin() {
    let mut tl = machine_timeline();
    let id = EntryId::from("d-1");
    tl.accept_entry(&id).unwrap();
    let entry = tl.entry(&id).unwrap();
    assert_eq!(entry.provenance.origin, Origin::AiAsr);
    assert!(entry.provenance.is_verified);
    assert_eq!(entry.provenance.confidence, Some(0.6));
}

#[test]
fn test_update_clamps_to_minimum_duration() {
    let mut tl = machine_timeline();
    let id = EntryId::from("d-1");
    tl.update_entry(&id, &EntryPatch::new().end(2.05)).unwrap();
    let entry = tl.entry(&id).unwrap();
    assert!(entry.duration() >= 0.2);

    tl.update_entry(&id, &EntryPatch::new().start(-5.0)).unwrap();
    assert_eq!(tl.entry(&id).unwrap().start, 0.0);

    assert_matches!(
        tl.update_entry(&id, &EntryPatch::new().end(f64::NAN)),
        Err(Rejection::InvalidTime)
    );
    assert_matches!(
        tl.update_entry(&EntryId::from("missing"), &EntryPatch::new().end(1.0)),
        Err(Rejection::EntryNotFound(_))
    );
}

#[test]
fn test_gestures_never_produce_short_entries() {
    let mut session = EditorSession::new(EngineConfig::default());
    let y = ROW_Y[2];

    // Create 1s..3s, then drag both edges far past each other and move it off the left end.
    session.pointer_down(20.0, y);
    session.pointer_move(40.0);
    session.pointer_up(60.0);
    let id = session.selected().cloned().unwrap();

    let gestures: [(f32, f32); 4] = [(59.0, -400.0), (21.0, 900.0), (30.0, -1000.0), (21.0, 5000.0)];
    for (press, release) in gestures {
        let entry = session.timeline().entry(&id).unwrap();
        let left = entry.start as f32 * 20.0;
        let right = entry.end as f32 * 20.0;
        let x = press.clamp(left, right);
        session.pointer_down(x, y);
        session.pointer_move((x + release) / 2.0);
        session.pointer_up(release);

        let entry = session.timeline().entry(&id).unwrap();
        assert!(entry.start >= 0.0);
        assert!(entry.duration() >= 0.2, "{:?}", entry);
    }
}

#[test]
fn test_add_entry_on_every_track_uses_factory() {
    let mut tl = Timeline::with_min_duration(0.2);
    for kind in TrackKind::ALL {
        assert!(kind.can(Capability::Create));
        let id = tl.add_entry(kind, 0.0, 1.0).unwrap();
        assert_eq!(tl.track_of(&id), Some(kind));
    }
    assert_eq!(tl.entry_count(), 4);
    let caption = tl.entries(TrackKind::Captions).next().unwrap();
    assert_eq!(caption.text(), Some("New Caption"));
    assert_eq!(caption.content.get_str("category"), Some("General"));
}

#[test]
fn test_add_entry_rejects_degenerate_ranges() {
    let mut tl = Timeline::with_min_duration(0.2);
    assert_matches!(tl.add_entry(TrackKind::Scenes, 1.0, 1.1), Err(Rejection::DurationTooShort { .. }));
    assert_matches!(tl.add_entry(TrackKind::Scenes, -1.0, 1.0), Err(Rejection::InvalidTime));
    assert_matches!(tl.add_entry(TrackKind::Scenes, 0.0, f64::INFINITY), Err(Rejection::InvalidTime));
    assert_eq!(tl.entry_count(), 0);
}
