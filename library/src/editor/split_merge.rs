use log::info;
use serde_json::Value;

use super::interaction::InteractionController;
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::model::capability::{Capability, TrackKind};
use crate::model::entry::EntryId;
use crate::model::timeline::Timeline;

/// Splits and merges the selected entry. Both only run while no gesture is
/// in flight.
pub struct SplitMergeOperator {
    epsilon: f64,
}

impl SplitMergeOperator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            epsilon: config.split_epsilon,
        }
    }

    fn target(
        &self,
        timeline: &Timeline,
        controller: &InteractionController,
        capability: Capability,
    ) -> Result<(EntryId, TrackKind), Rejection> {
        if !controller.is_idle() {
            return Err(Rejection::GestureInProgress);
        }
        let id = controller.selected().cloned().ok_or(Rejection::NoSelection)?;
        let kind = timeline
            .track_of(&id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;
        if !kind.can(capability) {
            return Err(Rejection::CapabilityDenied { kind, capability });
        }
        Ok((id, kind))
    }

    /// Cuts the selection at `time`. The original keeps `[start, time]`; a new
    /// entry with the same content covers `[time, end]` and becomes the selection.
    pub fn split(
        &self,
        timeline: &mut Timeline,
        controller: &mut InteractionController,
        time: f64,
    ) -> Result<EntryId, Rejection> {
        let (id, kind) = self.target(timeline, controller, Capability::Split)?;
        let original = timeline
            .entry(&id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;

        let inside = time > original.start + self.epsilon && time < original.end - self.epsilon;
        if !time.is_finite() || !inside {
            return Err(Rejection::SplitAtEdge { time });
        }

        let mut tail = original.duplicate(EntryId::generate());
        tail.start = time;
        tail.provenance.mark_human();

        timeline.with_entry_mut(&id, |head| {
            head.end = time;
            head.provenance.mark_human();
        })?;
        let tail_id = timeline
            .insert_entry_after(&id, tail)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;

        info!("Split {} entry {} at {:.3}s into {}", kind, id, time, tail_id);
        controller.select(Some(tail_id.clone()));
        Ok(tail_id)
    }

    /// Absorbs the entry that follows the selection (by start time) on the same
    /// track. Returns the id of the surviving entry.
    pub fn merge(&self, timeline: &mut Timeline, controller: &mut InteractionController) -> Result<EntryId, Rejection> {
        let (id, kind) = self.target(timeline, controller, Capability::Merge)?;
        let current = timeline
            .entry(&id)
            .ok_or_else(|| Rejection::EntryNotFound(id.clone()))?;
        let next = timeline.next_entry_after(&id).ok_or(Rejection::NoSuccessor)?;

        if let Some(key) = kind.definition().merge_requires_equal {
            let left = current.content.get(key);
            let right = next.content.get(key);
            if left != right {
                return Err(Rejection::SpeakerMismatch {
                    left: display_value(left),
                    right: display_value(right),
                });
            }
        }

        let joined = kind.is_text_bearing().then(|| {
            [current.text(), next.text()]
                .into_iter()
                .flatten()
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        });
        let new_end = next.end;
        let absorbed = next.id.clone();

        timeline.delete_entry(&absorbed);
        timeline.with_entry_mut(&id, |merged| {
            merged.end = new_end;
            if let Some(text) = joined {
                merged.content.set("text", text);
            }
            merged.provenance.mark_human();
        })?;

        info!("Merged {} entry {} into {}", kind, absorbed, id);
        Ok(id)
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
