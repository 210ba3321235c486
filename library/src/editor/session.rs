//! One open annotation document and everything needed to edit it.

use log::{debug, info, warn};
use serde_json::Value;

use super::command::EditorCommand;
use super::interaction::{CursorHint, GestureOutcome, InteractionController};
use super::split_merge::SplitMergeOperator;
use crate::adapter::{DocumentAdapter, DocumentMeta, LoadedDocument};
use crate::config::EngineConfig;
use crate::error::{EngineError, Rejection};
use crate::export::{CueExporter, CueSnapshot};
use crate::geometry::TimelineGeometry;
use crate::media::MediaClock;
use crate::model::capability::TrackKind;
use crate::model::entry::{Entry, EntryId, EntryPatch};
use crate::model::timeline::Timeline;
use crate::subtitles;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Short user-facing message, e.g. a toast.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub struct EditorSession {
    config: EngineConfig,
    geometry: TimelineGeometry,
    timeline: Timeline,
    controller: InteractionController,
    operator: SplitMergeOperator,
    cues: CueExporter,
    meta: DocumentMeta,
    notices: Vec<Notice>,
}

impl EditorSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            geometry: TimelineGeometry::new(&config),
            timeline: Timeline::new(&config),
            controller: InteractionController::new(&config),
            operator: SplitMergeOperator::new(&config),
            cues: CueExporter::new(&config),
            meta: DocumentMeta::default(),
            notices: Vec::new(),
            config,
        }
    }

    pub fn from_document(config: EngineConfig, doc: &Value) -> Result<Self, EngineError> {
        let mut session = Self::new(config);
        session.load_document(doc)?;
        Ok(session)
    }

    /// Replaces the open document. Any selection or gesture is dropped.
    pub fn load_document(&mut self, doc: &Value) -> Result<(), EngineError> {
        let LoadedDocument { timeline, meta } = match DocumentAdapter::inbound(doc, &self.config) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.notices.push(Notice::error(format!("Failed to load annotations: {}", e)));
                return Err(e);
            }
        };
        self.timeline = timeline;
        self.meta = meta;
        self.controller = InteractionController::new(&self.config);
        Ok(())
    }

    /// The document to persist.
    pub fn save_document(&self) -> Value {
        DocumentAdapter::outbound(&self.timeline, &self.meta)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn geometry(&self) -> &TimelineGeometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut TimelineGeometry {
        &mut self.geometry
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn selected(&self) -> Option<&EntryId> {
        self.controller.selected()
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.controller.selected().and_then(|id| self.timeline.entry(id))
    }

    pub fn select(&mut self, id: Option<EntryId>) {
        let id = id.filter(|id| self.timeline.entry(id).is_some());
        self.controller.select(id);
    }

    /// Width of the scrollable clip area: media duration, or the last entry
    /// end when the document does not record one.
    pub fn content_width(&self) -> f32 {
        let duration = self.meta.duration().unwrap_or_else(|| {
            TrackKind::ALL
                .into_iter()
                .flat_map(|kind| self.timeline.entries(kind))
                .map(|e| e.end)
                .fold(0.0, f64::max)
        });
        self.geometry.content_width(duration)
    }

    fn report<T>(&mut self, result: Result<T, Rejection>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(rejection) => {
                warn!("Rejected: {}", rejection);
                self.notices.push(Notice::warning(rejection.to_string()));
                None
            }
        }
    }

    // --- Pointer events ---

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let result = self.controller.pointer_down(&self.timeline, &self.geometry, x, y);
        self.report(result);
    }

    pub fn pointer_move(&mut self, x: f32) {
        let result = self.controller.pointer_move(&mut self.timeline, &self.geometry, x);
        self.report(result);
    }

    pub fn pointer_up(&mut self, x: f32) -> Option<GestureOutcome> {
        let result = self.controller.pointer_up(&mut self.timeline, &self.geometry, x);
        let outcome = self.report(result)?;
        debug!("Gesture finished: {:?}", outcome);
        Some(outcome)
    }

    pub fn cursor_hint(&self, x: f32, y: f32) -> CursorHint {
        self.controller.cursor_hint(&self.timeline, &self.geometry, x, y)
    }

    pub fn cancel_gesture(&mut self) -> GestureOutcome {
        self.controller.cancel(&mut self.timeline)
    }

    /// A click on the time ruler moves the playhead.
    pub fn seek_from_pixel(&self, x: f32, clock: &mut dyn MediaClock) {
        clock.seek(self.geometry.pixel_to_time(x));
    }

    // --- Commands ---

    /// Runs the command bound to `key`. Returns whether the key was bound.
    pub fn handle_key(&mut self, key: &str, clock: &mut dyn MediaClock) -> bool {
        match self.config.command_for_key(key) {
            Some(command) => {
                self.execute(command, clock);
                true
            }
            None => false,
        }
    }

    pub fn execute(&mut self, command: EditorCommand, clock: &mut dyn MediaClock) {
        debug!("Executing {}", command);
        match command {
            EditorCommand::DeleteSelection => {
                self.delete_selected();
            }
            EditorCommand::Split => {
                self.split_at_playhead(clock);
            }
            EditorCommand::Merge => {
                self.merge_selected();
            }
            EditorCommand::AcceptSelection => {
                self.accept_selected();
            }
            EditorCommand::CancelGesture => {
                self.cancel_gesture();
            }
            EditorCommand::ZoomIn => self.geometry.zoom_in(),
            EditorCommand::ZoomOut => self.geometry.zoom_out(),
        }
    }

    pub fn split_at(&mut self, time: f64) -> Option<EntryId> {
        let result = self.operator.split(&mut self.timeline, &mut self.controller, time);
        let id = self.report(result)?;
        self.notices.push(Notice::info("Split"));
        Some(id)
    }

    pub fn split_at_playhead(&mut self, clock: &dyn MediaClock) -> Option<EntryId> {
        self.split_at(clock.current_time())
    }

    pub fn merge_selected(&mut self) -> Option<EntryId> {
        let result = self.operator.merge(&mut self.timeline, &mut self.controller);
        let id = self.report(result)?;
        self.notices.push(Notice::info("Merged"));
        Some(id)
    }

    pub fn delete_selected(&mut self) -> Option<Entry> {
        let result = self.selected_target();
        let id = self.report(result)?;
        let removed = self.timeline.delete_entry(&id);
        self.controller.clear_selection();
        if removed.is_some() {
            info!("Deleted entry {}", id);
        }
        removed
    }

    /// Marks the selection reviewed without editing it.
    pub fn accept_selected(&mut self) -> bool {
        let result = self
            .selected_target()
            .and_then(|id| self.timeline.accept_entry(&id));
        self.report(result).is_some()
    }

    /// Inspector edits of one entry. Refused while a gesture is in flight.
    pub fn update_entry(&mut self, id: &EntryId, patch: &EntryPatch) -> bool {
        let result = if self.controller.is_idle() {
            self.timeline.update_entry(id, patch)
        } else {
            Err(Rejection::GestureInProgress)
        };
        self.report(result).unwrap_or(false)
    }

    fn selected_target(&self) -> Result<EntryId, Rejection> {
        if !self.controller.is_idle() {
            return Err(Rejection::GestureInProgress);
        }
        self.controller.selected().cloned().ok_or(Rejection::NoSelection)
    }

    // --- Derived data ---

    pub fn cue_snapshot(&self) -> CueSnapshot {
        self.cues.export(&self.timeline)
    }

    /// Appends an SRT transcript to the dialogue track.
    pub fn ingest_srt(&mut self, content: &str) -> usize {
        let ids = subtitles::ingest_srt(&mut self.timeline, content, &self.config);
        if ids.is_empty() {
            self.notices.push(Notice::warning("No subtitle cues found"));
        } else {
            self.notices.push(Notice::info(format!("Imported {} lines", ids.len())));
        }
        ids.len()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ManualClock;

    #[test]
    fn keys_dispatch_through_config() {
        let mut session = EditorSession::new(EngineConfig::default());
        let mut clock = ManualClock::default();
        let before = session.geometry().scale();
        assert!(session.handle_key("Equal", &mut clock));
        assert!(session.geometry().scale() > before);
        assert!(!session.handle_key("KeyQ", &mut clock));
    }

    #[test]
    fn rejections_become_notices() {
        let mut session = EditorSession::new(EngineConfig::default());
        let mut clock = ManualClock::at(1.0);
        session.execute(EditorCommand::Split, &mut clock);
        let notices = session.take_notices();
        assert_eq!(notices, vec![Notice::warning("nothing selected")]);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn ruler_click_seeks() {
        let session = EditorSession::new(EngineConfig::default());
        let mut clock = ManualClock::default();
        session.seek_from_pixel(50.0, &mut clock);
        assert_eq!(clock.current_time(), 2.5);
    }
}
