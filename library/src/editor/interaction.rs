//! Pointer-driven editing of the clip area.
//!
//! The controller turns pointer events into model edits. It owns the
//! selection and the in-flight gesture; the timeline is borrowed for the
//! duration of each event.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::geometry::TimelineGeometry;
use crate::model::capability::{Capability, TrackKind};
use crate::model::entry::{Entry, EntryId};
use crate::model::timeline::{Timeline, end_after, start_before};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Edge {
    Left,
    Right,
}

/// What lies under a pointer position.
#[derive(Clone, PartialEq, Debug)]
pub enum HitTarget {
    /// Below the last row or in the gap between rows.
    Outside,
    Empty { track: TrackKind },
    Body { track: TrackKind, entry: EntryId },
    Edge { track: TrackKind, entry: EntryId, edge: Edge },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    ResizeHorizontal,
    Crosshair,
}

#[derive(Clone, Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Creating {
        track: TrackKind,
        anchor_time: f64,
        anchor_x: f32,
        current_x: f32,
    },
    Moving {
        entry: EntryId,
        original_start: f64,
        original_end: f64,
        pointer_anchor: f32,
        original: Arc<Entry>,
    },
    Resizing {
        entry: EntryId,
        edge: Edge,
        original_start: f64,
        original_end: f64,
        pointer_anchor: f32,
        original: Arc<Entry>,
    },
}

/// How a gesture ended.
#[derive(Clone, PartialEq, Debug)]
pub enum GestureOutcome {
    /// Nothing was in flight.
    None,
    Created(EntryId),
    Moved(EntryId),
    Resized(EntryId),
    /// The pointer went down and up on an entry without moving it.
    Clicked(EntryId),
    /// A freehand creation that did not travel past the threshold, or was cancelled.
    Discarded,
    /// A move or resize was undone.
    Cancelled(EntryId),
}

pub struct InteractionController {
    state: GestureState,
    selection: Option<EntryId>,
    edge_margin_px: f32,
    create_threshold_px: f32,
}

impl InteractionController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: GestureState::Idle,
            selection: None,
            edge_margin_px: config.edge_margin_px,
            create_threshold_px: config.create_threshold_px,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn selected(&self) -> Option<&EntryId> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, id: Option<EntryId>) {
        self.selection = id;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Finds what is under `(x, y)`. `x` is in content pixels, `y` relative to
    /// the top of the first track row.
    pub fn hit_test(&self, timeline: &Timeline, geometry: &TimelineGeometry, x: f32, y: f32) -> HitTarget {
        let Some(track) = geometry.row_at(y).and_then(|row| TrackKind::ALL.get(row).copied()) else {
            return HitTarget::Outside;
        };

        // Later entries are painted on top, so they win.
        let ids = timeline.track(track).entry_ids();
        let spans = ids.iter().rev().filter_map(|id| {
            let entry = timeline.entry(id)?;
            let left = geometry.time_to_pixel(entry.start);
            let right = geometry.time_to_pixel(entry.end);
            (x >= left && x <= right).then_some((id, left, right))
        });

        let mut body = None;
        for (id, left, right) in spans {
            let from_left = x - left;
            let from_right = right - x;
            if from_left.min(from_right) <= self.edge_margin_px {
                let edge = if from_left <= from_right { Edge::Left } else { Edge::Right };
                return HitTarget::Edge {
                    track,
                    entry: id.clone(),
                    edge,
                };
            }
            if body.is_none() {
                body = Some(id.clone());
            }
        }

        match body {
            Some(entry) => HitTarget::Body { track, entry },
            None => HitTarget::Empty { track },
        }
    }

    pub fn pointer_down(
        &mut self,
        timeline: &Timeline,
        geometry: &TimelineGeometry,
        x: f32,
        y: f32,
    ) -> Result<(), Rejection> {
        if !self.is_idle() {
            return Err(Rejection::GestureInProgress);
        }

        match self.hit_test(timeline, geometry, x, y) {
            HitTarget::Outside => self.clear_selection(),
            HitTarget::Empty { track } => {
                self.clear_selection();
                if track.can(Capability::Create) {
                    self.state = GestureState::Creating {
                        track,
                        anchor_time: geometry.pixel_to_time(x),
                        anchor_x: x,
                        current_x: x,
                    };
                }
            }
            HitTarget::Edge { track, entry, edge } if track.can(Capability::Resize) => {
                self.begin_entry_gesture(timeline, entry, Some(edge), x);
            }
            HitTarget::Edge { track, entry, .. } | HitTarget::Body { track, entry } => {
                if track.can(Capability::Move) {
                    self.begin_entry_gesture(timeline, entry, None, x);
                } else {
                    self.select(Some(entry));
                }
            }
        }
        Ok(())
    }

    fn begin_entry_gesture(&mut self, timeline: &Timeline, id: EntryId, edge: Option<Edge>, x: f32) {
        let Some(original) = timeline.entry_arc(&id) else {
            return;
        };
        self.selection = Some(id.clone());
        let (original_start, original_end) = (original.start, original.end);
        self.state = match edge {
            Some(edge) => GestureState::Resizing {
                entry: id,
                edge,
                original_start,
                original_end,
                pointer_anchor: x,
                original,
            },
            None => GestureState::Moving {
                entry: id,
                original_start,
                original_end,
                pointer_anchor: x,
                original,
            },
        };
    }

    /// Applies the in-flight gesture at pointer position `x`. Moves and
    /// resizes write through to the model immediately.
    pub fn pointer_move(
        &mut self,
        timeline: &mut Timeline,
        geometry: &TimelineGeometry,
        x: f32,
    ) -> Result<(), Rejection> {
        let min = timeline.min_duration();
        let (id, start, end) = match &mut self.state {
            GestureState::Idle => return Ok(()),
            GestureState::Creating { current_x, .. } => {
                *current_x = x;
                return Ok(());
            }
            GestureState::Moving {
                entry,
                original_start,
                original_end,
                pointer_anchor,
                ..
            } => {
                let delta = geometry.delta_to_time(x - *pointer_anchor);
                let duration = *original_end - *original_start;
                let start = (*original_start + delta).max(0.0);
                (entry.clone(), start, end_after(start, duration))
            }
            GestureState::Resizing {
                entry,
                edge,
                original_start,
                original_end,
                pointer_anchor,
                ..
            } => {
                let delta = geometry.delta_to_time(x - *pointer_anchor);
                match edge {
                    Edge::Left => {
                        let start = (*original_start + delta).min(start_before(*original_end, min)).max(0.0);
                        (entry.clone(), start, *original_end)
                    }
                    Edge::Right => {
                        let end = (*original_end + delta).max(end_after(*original_start, min));
                        (entry.clone(), *original_start, end)
                    }
                }
            }
        };

        if let Err(rejection) = timeline.set_range(&id, start, end) {
            warn!("Gesture target vanished: {}", rejection);
            self.state = GestureState::Idle;
            return Err(rejection);
        }
        Ok(())
    }

    /// Finishes the gesture and returns to idle.
    pub fn pointer_up(
        &mut self,
        timeline: &mut Timeline,
        geometry: &TimelineGeometry,
        x: f32,
    ) -> Result<GestureOutcome, Rejection> {
        self.pointer_move(timeline, geometry, x)?;

        match std::mem::take(&mut self.state) {
            GestureState::Idle => Ok(GestureOutcome::None),
            GestureState::Creating {
                track,
                anchor_time,
                anchor_x,
                ..
            } => {
                if (x - anchor_x).abs() <= self.create_threshold_px {
                    debug!("Creation on {} below threshold; discarded", track);
                    return Ok(GestureOutcome::Discarded);
                }
                let here = geometry.pixel_to_time(x);
                let start = anchor_time.min(here);
                let end = anchor_time.max(here).max(end_after(start, timeline.min_duration()));
                let id = timeline.add_entry(track, start, end)?;
                self.selection = Some(id.clone());
                Ok(GestureOutcome::Created(id))
            }
            GestureState::Moving { entry, original, .. } => Ok(Self::settled(timeline, entry, &original, false)),
            GestureState::Resizing { entry, original, .. } => Ok(Self::settled(timeline, entry, &original, true)),
        }
    }

    fn settled(timeline: &Timeline, id: EntryId, original: &Entry, resized: bool) -> GestureOutcome {
        let unchanged = timeline
            .entry(&id)
            .is_some_and(|e| e.start == original.start && e.end == original.end);
        match (unchanged, resized) {
            (true, _) => GestureOutcome::Clicked(id),
            (false, true) => GestureOutcome::Resized(id),
            (false, false) => GestureOutcome::Moved(id),
        }
    }

    /// Abandons the in-flight gesture. A move or resize puts the entry back
    /// exactly as it was, provenance included.
    pub fn cancel(&mut self, timeline: &mut Timeline) -> GestureOutcome {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => GestureOutcome::None,
            GestureState::Creating { .. } => GestureOutcome::Discarded,
            GestureState::Moving { entry, original, .. } | GestureState::Resizing { entry, original, .. } => {
                timeline.restore_entry(original);
                GestureOutcome::Cancelled(entry)
            }
        }
    }

    /// Range of a creation in progress, for drawing the ghost clip.
    pub fn provisional_range(&self, geometry: &TimelineGeometry) -> Option<(TrackKind, f64, f64)> {
        match &self.state {
            GestureState::Creating {
                track,
                anchor_time,
                current_x,
                ..
            } => {
                let here = geometry.pixel_to_time(*current_x);
                Some((*track, anchor_time.min(here), anchor_time.max(here)))
            }
            _ => None,
        }
    }

    pub fn cursor_hint(&self, timeline: &Timeline, geometry: &TimelineGeometry, x: f32, y: f32) -> CursorHint {
        match &self.state {
            GestureState::Creating { .. } => return CursorHint::Crosshair,
            GestureState::Moving { .. } => return CursorHint::Grab,
            GestureState::Resizing { .. } => return CursorHint::ResizeHorizontal,
            GestureState::Idle => {}
        }
        match self.hit_test(timeline, geometry, x, y) {
            HitTarget::Outside => CursorHint::Default,
            HitTarget::Empty { track } if track.can(Capability::Create) => CursorHint::Crosshair,
            HitTarget::Empty { .. } => CursorHint::Default,
            HitTarget::Edge { track, .. } if track.can(Capability::Resize) => CursorHint::ResizeHorizontal,
            HitTarget::Edge { track, .. } | HitTarget::Body { track, .. } if track.can(Capability::Move) => {
                CursorHint::Grab
            }
            HitTarget::Edge { .. } | HitTarget::Body { .. } => CursorHint::Default,
        }
    }
}
