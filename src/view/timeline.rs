//! Per-frame allocation timeline.
//!
//! Shows the total allocated bytes of every frame between the first and
//! last frame seen. Frames can be picked one at a time, toggled, or swept
//! with a region: the first press anchors the region, moving stretches
//! it, the second press commits it.

use super::events::ViewEvent;
use crate::utils::config::BYTES_PER_MB;
use std::collections::{BTreeMap, BTreeSet};

/// Headroom above the tallest point
const Y_HEADROOM: f64 = 1.1;

#[derive(Debug, Clone, Default)]
pub struct TimelineView {
    frame_data: BTreeMap<i64, u64>,
    selected: BTreeSet<i64>,
    region: Option<(f64, f64)>,
    region_start: Option<f64>,
}

impl TimelineView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the data; selection and region are dropped
    pub fn update_data(&mut self, frame_data: BTreeMap<i64, u64>) {
        self.frame_data = frame_data;
        self.selected.clear();
        self.region = None;
        self.region_start = None;
    }

    pub fn frame_data(&self) -> &BTreeMap<i64, u64> {
        &self.frame_data
    }

    /// `(frame, MB)` for every frame
    pub fn points(&self) -> Vec<(i64, f64)> {
        self.frame_data
            .iter()
            .map(|(frame, size)| (*frame, *size as f64 / BYTES_PER_MB))
            .collect()
    }

    /// Selected frames with their MB value, for highlighting
    pub fn highlighted_points(&self) -> Vec<(i64, f64)> {
        self.selected
            .iter()
            .map(|frame| {
                let size = self.frame_data.get(frame).copied().unwrap_or(0);
                (*frame, size as f64 / BYTES_PER_MB)
            })
            .collect()
    }

    /// Axis ranges: one frame of padding on x, 10% headroom on y
    pub fn ranges(&self) -> Option<((i64, i64), (f64, f64))> {
        let first = *self.frame_data.keys().next()?;
        let last = *self.frame_data.keys().next_back()?;
        let peak = self.points().iter().map(|(_, mb)| *mb).fold(0.0, f64::max);
        Some(((first - 1, last + 1), (0.0, peak * Y_HEADROOM)))
    }

    pub fn selected_frames(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    /// Active region in frame units, if shown
    pub fn region(&self) -> Option<(f64, f64)> {
        self.region
    }

    pub fn is_selecting(&self) -> bool {
        self.region_start.is_some()
    }

    /// Click on a point; `toggle` adds or removes it instead of replacing
    pub fn click_point(&mut self, frame: i64, toggle: bool) -> Option<ViewEvent> {
        if !self.frame_data.contains_key(&frame) {
            return None;
        }
        if toggle {
            if !self.selected.remove(&frame) {
                self.selected.insert(frame);
            }
        } else {
            self.selected = BTreeSet::from([frame]);
            self.region = None;
        }
        Some(self.emit())
    }

    /// Press on empty plot area: start a region, or finish the one in progress
    pub fn press(&mut self, x: f64) -> Option<ViewEvent> {
        match self.region_start.take() {
            None => {
                self.region_start = Some(x);
                self.region = Some((x, x));
                None
            }
            Some(_) => Some(self.select_region()),
        }
    }

    /// Stretch the region in progress
    pub fn move_to(&mut self, x: f64) {
        if let Some(start) = self.region_start {
            self.region = Some((start.min(x), start.max(x)));
        }
    }

    /// Move a committed region; reselects the frames inside it
    pub fn drag_region(&mut self, min: f64, max: f64) -> Option<ViewEvent> {
        if self.region.is_none() || self.is_selecting() {
            return None;
        }
        self.region = Some((min.min(max), min.max(max)));
        Some(self.select_region())
    }

    fn select_region(&mut self) -> ViewEvent {
        if let Some((min, max)) = self.region {
            self.selected = self
                .frame_data
                .keys()
                .copied()
                .filter(|frame| min <= *frame as f64 && *frame as f64 <= max)
                .collect();
        }
        self.emit()
    }

    fn emit(&self) -> ViewEvent {
        ViewEvent::FramesSelected(self.selected_frames())
    }
}
