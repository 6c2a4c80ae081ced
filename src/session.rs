//! Loaded corpus plus the three views built from it.
//!
//! Loading parses both dumps before touching any state, so a failed load
//! leaves the previous corpus and every view exactly as they were. View
//! events come back here to be turned into status-bar text.

use crate::parser::{parse_allocation_file, parse_stack_file, AllocationIndex, TraceMap};
use crate::utils::error::ParseError;
use crate::utils::format::{format_mb, format_mb_f64};
use crate::view::{CallTreeView, FlameView, TimelineView, ViewEvent, Viewport};
use log::{info, warn};
use std::path::Path;

/// Status text shown before anything is loaded
pub const READY: &str = "Ready";

#[derive(Debug, Clone)]
pub struct Session {
    traces: TraceMap,
    allocations: AllocationIndex,
    pub flame: FlameView,
    pub call_tree: CallTreeView,
    pub timeline: TimelineView,
    status: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl Session {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            traces: TraceMap::new(),
            allocations: AllocationIndex::new(),
            flame: FlameView::new(viewport),
            call_tree: CallTreeView::new(),
            timeline: TimelineView::new(),
            status: READY.to_string(),
        }
    }

    /// Parse both dumps and swap them in
    ///
    /// # Errors
    /// * `ParseError::Unreadable` - either file could not be read; nothing
    ///   changes except the status message
    pub fn load(&mut self, stack_path: impl AsRef<Path>, alloc_path: impl AsRef<Path>) -> Result<(), ParseError> {
        let parsed = parse_stack_file(stack_path.as_ref())
            .and_then(|traces| parse_allocation_file(alloc_path.as_ref()).map(|allocs| (traces, allocs)));

        match parsed {
            Ok((traces, allocations)) => {
                self.load_corpus(traces, allocations);
                Ok(())
            }
            Err(e) => {
                warn!("Load failed: {}", e);
                self.status = format!("Failed to load files: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the corpus with already parsed data and refresh every view
    pub fn load_corpus(&mut self, traces: TraceMap, allocations: AllocationIndex) {
        info!(
            "Loaded {} stacks and {} allocation records",
            traces.len(),
            allocations.len()
        );
        self.traces = traces;
        self.allocations = allocations;
        self.update_views();
        self.status = "Files loaded".to_string();
    }

    /// Rebuild the flame graph, call tree and timeline from the corpus
    pub fn update_views(&mut self) {
        self.flame.update_data(&self.traces, &self.allocations);
        self.call_tree.update_data(&self.traces, &self.allocations);
        self.timeline.update_data(self.allocations.frame_totals());
    }

    pub fn traces(&self) -> &TraceMap {
        &self.traces
    }

    pub fn allocations(&self) -> &AllocationIndex {
        &self.allocations
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Route an event from any view to the status bar
    pub fn handle_event(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::StackSelected(id) => self.on_stack_selected(id),
            ViewEvent::FramesSelected(frames) => self.on_frames_selected(frames),
            ViewEvent::Hovered { .. } => {}
        }
    }

    /// Status line for a selected stack; unknown or empty stacks are ignored
    pub fn on_stack_selected(&mut self, hash_id: &str) {
        let count = self.allocations.hash_count(hash_id);
        if !self.traces.contains_key(hash_id) || count == 0 {
            return;
        }
        self.status = format!(
            "Stack {}: {} allocations, total {}",
            hash_id,
            count,
            format_mb(self.allocations.hash_total_size(hash_id))
        );
    }

    pub fn on_frames_selected(&mut self, frames: &[i64]) {
        let (Some(first), Some(last)) = (frames.iter().min(), frames.iter().max()) else {
            self.status = "No frames selected".to_string();
            return;
        };

        let count: usize = frames
            .iter()
            .map(|f| self.allocations.frame_allocations(*f).len())
            .sum();
        let total = frames
            .iter()
            .fold(0u64, |sum, f| sum.saturating_add(self.allocations.frame_total_size(*f)));

        self.status = if frames.len() == 1 {
            format!("Frame {}: {} allocations, total {}", first, count, format_mb(total))
        } else {
            format!(
                "Frames {}-{}: {} allocations, total {}, average {} per frame",
                first,
                last,
                count,
                format_mb(total),
                format_mb_f64(total as f64 / frames.len() as f64)
            )
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_allocations, parse_stacks};

    fn session() -> Session {
        let mut session = Session::default();
        session.load_corpus(
            parse_stacks("hash:a\nmain\nload\n"),
            parse_allocations("size: 1048576\nhash: a\nframe: 2\n\nsize: 2097152\nhash: a\nframe: 4\n"),
        );
        session
    }

    #[test]
    fn test_stack_status() {
        let mut session = session();
        session.on_stack_selected("a");
        assert_eq!(session.status(), "Stack a: 2 allocations, total 3.0 MB");
    }

    #[test]
    fn test_unknown_stack_keeps_status() {
        let mut session = session();
        session.on_stack_selected("missing");
        assert_eq!(session.status(), "Files loaded");
    }

    #[test]
    fn test_frame_status_messages() {
        let mut session = session();
        session.on_frames_selected(&[2]);
        assert_eq!(session.status(), "Frame 2: 1 allocations, total 1.0 MB");

        session.on_frames_selected(&[2, 3, 4]);
        assert_eq!(
            session.status(),
            "Frames 2-4: 2 allocations, total 3.0 MB, average 1.0 MB per frame"
        );

        session.on_frames_selected(&[]);
        assert_eq!(session.status(), "No frames selected");
    }

    #[test]
    fn test_views_populated() {
        let session = session();
        assert_eq!(session.timeline.frame_data().len(), 3);
        assert_eq!(session.call_tree.rows().len(), 2);
        assert_eq!(session.flame.scene().len(), 2);
    }

    #[test]
    fn test_frame_average_is_fractional() {
        let mut session = Session::default();
        session.load_corpus(
            parse_stacks("hash:a\nmain\n"),
            parse_allocations("size: 314573\nhash: a\nframe: 2\n"),
        );
        session.on_frames_selected(&[2, 3]);
        assert_eq!(
            session.status(),
            "Frames 2-3: 1 allocations, total 0.3 MB, average 0.2 MB per frame"
        );
    }
}
