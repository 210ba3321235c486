use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use ordered_float::OrderedFloat;

use super::capability::{Capability, TrackKind};
use super::entry::{Entry, EntryId, EntryPatch, Provenance};
use super::track::Track;
use crate::config::EngineConfig;
use crate::error::Rejection;

/// Which edge an out-of-range edit should keep fixed when clamping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RangeAnchor {
    /// `start` stays, `end` is pushed out.
    Start,
    /// `end` stays, `start` is pulled in.
    End,
}

#[derive(Clone, Debug)]
struct Slot {
    track: TrackKind,
    entry: Arc<Entry>,
}

/// The annotation model: every track plus an id-indexed entry table.
///
/// Entries are stored behind `Arc`, so cloning a `Timeline` is a cheap
/// snapshot that shares entry storage. A later mutation copies only the entry
/// it touches.
#[derive(Clone, Debug)]
pub struct Timeline {
    tracks: Vec<Track>,
    slots: HashMap<EntryId, Slot>,
    min_duration: f64,
}

impl Timeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_min_duration(config.min_duration)
    }

    pub fn with_min_duration(min_duration: f64) -> Self {
        Self {
            tracks: TrackKind::ALL.into_iter().map(Track::new).collect(),
            slots: HashMap::new(),
            min_duration,
        }
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> &Track {
        // Tracks are built from TrackKind::ALL, so every kind is present.
        &self.tracks[Self::track_index(kind)]
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut Track {
        &mut self.tracks[Self::track_index(kind)]
    }

    fn track_index(kind: TrackKind) -> usize {
        TrackKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default()
    }

    pub fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.slots.get(id).map(|slot| slot.entry.as_ref())
    }

    pub fn find_entry(&self, id: &EntryId) -> Option<(&Entry, &Track)> {
        self.slots
            .get(id)
            .map(|slot| (slot.entry.as_ref(), self.track(slot.track)))
    }

    pub fn track_of(&self, id: &EntryId) -> Option<TrackKind> {
        self.slots.get(id).map(|slot| slot.track)
    }

    /// Entries of a track in storage order.
    pub fn entries(&self, kind: TrackKind) -> impl Iterator<Item = &Entry> {
        self.track(kind)
            .entry_ids()
            .iter()
            .filter_map(|id| self.entry(id))
    }

    /// Entries of a track ordered by start time (stable for equal starts).
    pub fn sorted_entries(&self, kind: TrackKind) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries(kind).collect();
        entries.sort_by_key(|e| OrderedFloat(e.start));
        entries
    }

    /// Rewrites a track's storage order to match start times.
    pub fn reflow(&mut self, kind: TrackKind) {
        let order: Vec<EntryId> = self.sorted_entries(kind).into_iter().map(|e| e.id.clone()).collect();
        self.track_mut(kind).set_order(order);
    }

    pub fn entry_count(&self) -> usize {
        self.slots.len()
    }

    /// The entry on the same track that follows `id` by start time.
    pub fn next_entry_after(&self, id: &EntryId) -> Option<&Entry> {
        let kind = self.track_of(id)?;
        let sorted = self.sorted_entries(kind);
        let pos = sorted.iter().position(|e| e.id == *id)?;
        sorted.get(pos + 1).copied()
    }

    pub(crate) fn entry_arc(&self, id: &EntryId) -> Option<Arc<Entry>> {
        self.slots.get(id).map(|slot| Arc::clone(&slot.entry))
    }

    fn entry_mut(&mut self, id: &EntryId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id)
            .map(|slot| Arc::make_mut(&mut slot.entry))
    }

    /// Forces `[start, end]` into a legal range: `start >= 0` and at least the
    /// minimum duration long.
    pub fn clamp_range(&self, start: f64, end: f64, anchor: RangeAnchor) -> (f64, f64) {
        let min = self.min_duration;
        let mut start = start.max(0.0);
        let mut end = end;
        if end - start < min {
            match anchor {
                RangeAnchor::Start => end = end_after(start, min),
                RangeAnchor::End => {
                    start = start_before(end, min);
                    if end - start < min {
                        end = end_after(start, min);
                    }
                }
            }
        }
        (start, end)
    }

    /// Creates an entry with the track's default content.
    pub fn add_entry(&mut self, kind: TrackKind, start: f64, end: f64) -> Result<EntryId, Rejection> {
        if !kind.can(Capability::Create) {
            return Err(Rejection::CapabilityDenied {
                kind,
                capability: Capability::Create,
            });
        }
        if !start.is_finite() || !end.is_finite() || start < 0.0 {
            return Err(Rejection::InvalidTime);
        }
        let duration = end - start;
        if duration < self.min_duration {
            return Err(Rejection::DurationTooShort {
                duration,
                min: self.min_duration,
            });
        }
        let entry = Entry::new(
            EntryId::generate(),
            start,
            end,
            kind.definition().factory(),
            Provenance::human(),
        );
        debug!("Adding {} entry {} [{:.3}, {:.3}]", kind, entry.id, start, end);
        Ok(self.insert_entry(kind, entry))
    }

    /// Stores an already-built entry. Ids must be unique across the document,
    /// so a colliding id is replaced with a fresh one.
    pub(crate) fn insert_entry(&mut self, kind: TrackKind, mut entry: Entry) -> EntryId {
        if self.slots.contains_key(&entry.id) {
            let fresh = EntryId::generate();
            warn!(
                "Duplicate entry id {} on {} track; reassigned to {}",
                entry.id, kind, fresh
            );
            entry.id = fresh;
        }
        let id = entry.id.clone();
        self.track_mut(kind).push(id.clone());
        self.slots.insert(
            id.clone(),
            Slot {
                track: kind,
                entry: Arc::new(entry),
            },
        );
        id
    }

    /// Inserts right after `anchor` in storage order, keeping split halves adjacent.
    pub(crate) fn insert_entry_after(&mut self, anchor: &EntryId, entry: Entry) -> Option<EntryId> {
        let kind = self.track_of(anchor)?;
        let id = self.insert_entry(kind, entry);
        let track = self.track_mut(kind);
        track.remove(&id);
        track.insert_after(anchor, id.clone());
        Some(id)
    }

    /// Applies a patch. Returns whether anything changed; a change to times
    /// or content hands the entry over to human provenance.
    pub fn update_entry(&mut self, id: &EntryId, patch: &EntryPatch) -> Result<bool, Rejection> {
        let current = self
            .entry(id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;

        let start = patch.start.unwrap_or(current.start);
        let end = patch.end.unwrap_or(current.end);
        if !start.is_finite() || !end.is_finite() {
            return Err(Rejection::InvalidTime);
        }
        let anchor = if patch.start.is_some() && patch.end.is_none() {
            RangeAnchor::End
        } else {
            RangeAnchor::Start
        };
        let (start, end) = self.clamp_range(start, end, anchor);

        let times_changed = start != current.start || end != current.end;
        let content_changed = patch
            .set
            .iter()
            .any(|(k, v)| current.content.get(k) != Some(v))
            || patch.remove.iter().any(|k| current.content.contains_key(k));

        if !times_changed && !content_changed {
            return Ok(false);
        }

        let Some(entry) = self.entry_mut(id) else {
            return Err(Rejection::EntryNotFound(id.clone()));
        };
        entry.start = start;
        entry.end = end;
        for (k, v) in &patch.set {
            entry.content.set(k.clone(), v.clone());
        }
        for k in &patch.remove {
            entry.content.remove(k);
        }
        entry.provenance.mark_human();
        Ok(true)
    }

    /// Writes new times without capability checks; used by gestures that
    /// already validated and clamped them.
    pub(crate) fn set_range(&mut self, id: &EntryId, start: f64, end: f64) -> Result<bool, Rejection> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;
        if entry.start == start && entry.end == end {
            return Ok(false);
        }
        entry.start = start;
        entry.end = end;
        entry.provenance.mark_human();
        Ok(true)
    }

    pub(crate) fn with_entry_mut<R>(
        &mut self,
        id: &EntryId,
        f: impl FnOnce(&mut Entry) -> R,
    ) -> Result<R, Rejection> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;
        Ok(f(entry))
    }

    /// Puts back a previously captured version of an entry, provenance included.
    pub(crate) fn restore_entry(&mut self, original: Arc<Entry>) {
        match self.slots.get_mut(&original.id) {
            Some(slot) => slot.entry = original,
            None => warn!("Cannot restore entry {}: no longer present", original.id),
        }
    }

    /// Marks an entry as reviewed without changing it.
    pub fn accept_entry(&mut self, id: &EntryId) -> Result<(), Rejection> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;
        entry.provenance.accept();
        Ok(())
    }

    /// Removes an entry. Unknown ids are ignored.
    pub fn delete_entry(&mut self, id: &EntryId) -> Option<Entry> {
        let slot = self.slots.remove(id)?;
        self.track_mut(slot.track).remove(id);
        debug!("Deleted {} entry {}", slot.track, id);
        Some(Arc::unwrap_or_clone(slot.entry))
    }

    /// Entries violating `0 <= start < end` or the minimum duration.
    pub fn degenerate_entries(&self) -> Vec<&Entry> {
        let min = self.min_duration;
        TrackKind::ALL
            .into_iter()
            .flat_map(|kind| self.entries(kind))
            .filter(|e| e.start < 0.0 || e.end - e.start < min)
            .collect()
    }
}

/// The first `end` at or past `start + span` whose difference from `start`
/// is not rounded below `span`.
pub(crate) fn end_after(start: f64, span: f64) -> f64 {
    let mut end = start + span;
    while end.is_finite() && end - start < span {
        end = next_up(end);
    }
    end
}

/// The latest `start` at or before `end - span` whose difference from `end`
/// is not rounded below `span`, floored at zero.
pub(crate) fn start_before(end: f64, span: f64) -> f64 {
    let mut start = end - span;
    while start > 0.0 && end - start < span {
        start = -next_up(-start);
    }
    start.max(0.0)
}

fn next_up(x: f64) -> f64 {
    if x == 0.0 {
        f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        f64::from_bits(x.to_bits() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::Origin;

    fn timeline() -> Timeline {
        Timeline::with_min_duration(0.2)
    }

    #[test]
    fn add_entry_uses_factory_and_human_provenance() {
        let mut tl = timeline();
        let id = tl.add_entry(TrackKind::Dialogues, 1.0, 3.0).unwrap();
        let (entry, track) = tl.find_entry(&id).unwrap();
        assert_eq!(track.kind, TrackKind::Dialogues);
        assert_eq!(entry.content.get_str("speaker"), Some("Unknown"));
        assert_eq!(entry.provenance.origin, Origin::Human);
        assert!(entry.provenance.is_verified);
    }

    #[test]
    fn add_entry_rejects_short_ranges() {
        let mut tl = timeline();
        let err = tl.add_entry(TrackKind::Scenes, 1.0, 1.1).unwrap_err();
        assert!(matches!(err, Rejection::DurationTooShort { .. }));
        assert_eq!(tl.entry_count(), 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut tl = timeline();
        let id = tl.add_entry(TrackKind::Captions, 0.0, 2.0).unwrap();
        let snapshot = tl.clone();
        tl.update_entry(&id, &EntryPatch::new().end(5.0)).unwrap();
        assert_eq!(snapshot.entry(&id).unwrap().end, 2.0);
        assert_eq!(tl.entry(&id).unwrap().end, 5.0);
    }

    #[test]
    fn clamp_range_respects_anchor() {
        let tl = timeline();
        let (s, e) = tl.clamp_range(1.0, 1.05, RangeAnchor::Start);
        assert!(s == 1.0 && (e - 1.2).abs() < 1e-9);
        let (s, e) = tl.clamp_range(1.0, 1.05, RangeAnchor::End);
        assert!((s - 0.85).abs() < 1e-9 && e == 1.05);
        assert_eq!(tl.clamp_range(-3.0, 0.1, RangeAnchor::End), (0.0, 0.2));
    }

    #[test]
    fn clamped_ranges_pass_the_exact_duration_check() {
        let mut tl = timeline();
        for step in 0..5000 {
            let start = step as f64 * 0.037;
            let (s, e) = tl.clamp_range(start, start, RangeAnchor::Start);
            assert!(e - s >= 0.2, "[{}, {}]", s, e);
            let (s, e) = tl.clamp_range(start + 0.1, start + 0.1, RangeAnchor::End);
            assert!(e - s >= 0.2, "[{}, {}]", s, e);
            assert!(tl.add_entry(TrackKind::Captions, s, e).is_ok());
        }
        assert!(tl.degenerate_entries().is_empty());
    }

    #[test]
    fn end_after_overshoots_by_at_most_a_few_ulps() {
        assert_eq!(end_after(10.0, 1.0), 11.0);
        let end = end_after(1.0, 0.2);
        assert!(end - 1.0 >= 0.2);
        assert!(end - 1.2 < 1e-12);
        assert_eq!(start_before(0.1, 0.2), 0.0);
    }

    #[test]
    fn reflow_sorts_storage_order() {
        let mut tl = timeline();
        let late = tl.add_entry(TrackKind::Captions, 5.0, 6.0).unwrap();
        let early = tl.add_entry(TrackKind::Captions, 1.0, 2.0).unwrap();
        tl.reflow(TrackKind::Captions);
        assert_eq!(tl.track(TrackKind::Captions).entry_ids(), &[early, late]);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut tl = timeline();
        let id = tl.add_entry(TrackKind::Scenes, 0.0, 1.0).unwrap();
        assert!(tl.delete_entry(&id).is_some());
        assert!(tl.delete_entry(&id).is_none());
        assert!(tl.track(TrackKind::Scenes).is_empty());
    }
}
