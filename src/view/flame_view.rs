//! Interactive flame graph view.
//!
//! Owns the corpus it was given, the flame tree built from it and the
//! scene of rectangles. Input arrives as viewport coordinates and explicit
//! timestamps; output is [`ViewEvent`]s plus the mutated scene, which a
//! renderer draws as-is.
//!
//! Selection only repaints the two rectangles whose border changed. Search
//! only swaps fills. Everything else (reload, stack order toggle, resize)
//! recomputes the layout from scratch and drops any pan or zoom.

use super::events::ViewEvent;
use super::search::SearchDebouncer;
use crate::aggregator::{build_merge_tree, stack_sizes, MergeOptions, NodeId, StackSizes};
use crate::flamegraph::color::SEARCH_MATCH;
use crate::flamegraph::layout::{compute_layout, FlameTree, LayoutConfig, SceneBounds, ScrollAnchor};
use crate::flamegraph::scene::{node_allocations, AllocCounts, Pen, Scene};
use crate::parser::{AllocationIndex, TraceMap};
use crate::utils::config::{STATUS_HEIGHT, STATUS_MARGIN, STATUS_WIDTH, ZOOM_FACTOR};
use crate::utils::format::format_mb;
use log::debug;
use std::collections::HashSet;
use std::time::Instant;

/// What the view is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Hover,
    Selected,
    Searching,
    Panning,
}

/// Visible area in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1220.0,
            height: 600.0,
        }
    }
}

/// Scale and scroll offset; scroll is the scene point at the viewport's
/// top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// Floating box describing the selected node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusOverlay {
    pub visible: bool,
    pub text: String,
    /// Top-left corner in viewport pixels
    pub x: f64,
    pub y: f64,
}

impl StatusOverlay {
    pub const WIDTH: f64 = STATUS_WIDTH;
    pub const HEIGHT: f64 = STATUS_HEIGHT;
}

/// Result of a selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOutcome {
    pub events: Vec<ViewEvent>,
    /// Nodes whose border changed
    pub repainted: Vec<NodeId>,
}

/// Tooltip payload for the rectangle under the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub node: NodeId,
    pub tooltip: String,
    pub event: ViewEvent,
}

#[derive(Debug, Clone)]
pub struct FlameView {
    traces: TraceMap,
    sizes: StackSizes,
    alloc_counts: AllocCounts,
    has_allocations: bool,

    reverse_stack: bool,
    viewport: Viewport,

    tree: FlameTree,
    bounds: SceneBounds,
    scene: Scene,

    selected: Option<NodeId>,
    hovered: Option<NodeId>,

    search_term: String,
    matches: Vec<NodeId>,
    debouncer: SearchDebouncer,

    transform: Transform,
    pan_last: Option<(f64, f64)>,
    status: StatusOverlay,
}

impl Default for FlameView {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl FlameView {
    pub fn new(viewport: Viewport) -> Self {
        let mut tree = FlameTree::new();
        let config = LayoutConfig::for_viewport(viewport.width, false);
        let bounds = compute_layout(&mut tree, &config);
        Self {
            traces: TraceMap::new(),
            sizes: StackSizes::new(),
            alloc_counts: AllocCounts::new(),
            has_allocations: false,
            reverse_stack: false,
            viewport,
            tree,
            bounds,
            scene: Scene::default(),
            selected: None,
            hovered: None,
            search_term: String::new(),
            matches: Vec::new(),
            debouncer: SearchDebouncer::default(),
            transform: Transform::default(),
            pan_last: None,
            status: StatusOverlay::default(),
        }
    }

    /// Replace the corpus and rebuild everything
    ///
    /// Selection and the status overlay are dropped; an active search is
    /// re-applied to the new scene.
    pub fn update_data(&mut self, traces: &TraceMap, allocations: &AllocationIndex) {
        self.traces = traces.clone();
        self.sizes = stack_sizes(traces, allocations);
        self.alloc_counts = traces
            .keys()
            .map(|id| (id.clone(), allocations.hash_count(id)))
            .collect();
        self.has_allocations = !allocations.is_empty();
        self.status = StatusOverlay::default();
        self.rebuild();
    }

    pub fn reverse_stack(&self) -> bool {
        self.reverse_stack
    }

    /// Switch stack order; a visible status overlay moves to its new corner
    pub fn set_reverse_stack(&mut self, reverse: bool) {
        if self.reverse_stack == reverse {
            return;
        }
        self.reverse_stack = reverse;
        self.rebuild();
        if self.status.visible {
            self.place_status();
        }
    }

    pub fn toggle_stack_order(&mut self) {
        self.set_reverse_stack(!self.reverse_stack);
    }

    /// New viewport size; node ids survive so selection is kept, while pan
    /// and zoom go back to the default edge
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
        self.relayout();
        if self.status.visible {
            self.place_status();
        }
    }

    fn rebuild(&mut self) {
        self.selected = None;
        self.hovered = None;
        self.pan_last = None;

        self.tree = if self.traces.is_empty() || !self.has_allocations {
            FlameTree::new()
        } else {
            build_merge_tree(&self.traces, &self.sizes, MergeOptions::flame(self.reverse_stack))
        };
        self.relayout();
    }

    fn relayout(&mut self) {
        let config = LayoutConfig::for_viewport(self.viewport.width, self.reverse_stack);
        self.bounds = compute_layout(&mut self.tree, &config);
        self.scene = Scene::build(
            &self.tree,
            self.bounds,
            &self.alloc_counts,
            self.selected,
            &HashSet::new(),
        );
        if !self.search_term.is_empty() {
            let term = self.search_term.clone();
            self.run_search(&term);
        }
        self.transform = Transform::default();
        self.scroll_to_anchor();
        debug!(
            "Flame view laid out {} rectangles (reverse: {})",
            self.scene.len(),
            self.reverse_stack
        );
    }

    fn scroll_to_anchor(&mut self) {
        self.transform.scroll_x = self.bounds.x;
        self.transform.scroll_y = match self.bounds.anchor {
            ScrollAnchor::Top => self.bounds.y,
            ScrollAnchor::Bottom => self.bounds.bottom() - self.viewport.height / self.transform.scale,
        };
    }

    pub fn tree(&self) -> &FlameTree {
        &self.tree
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bounds(&self) -> SceneBounds {
        self.bounds
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn status(&self) -> &StatusOverlay {
        &self.status
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Nodes matching the active search, in scene order
    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    pub fn state(&self) -> ViewState {
        if self.pan_last.is_some() {
            ViewState::Panning
        } else if !self.search_term.is_empty() || self.debouncer.is_pending() {
            ViewState::Searching
        } else if self.selected.is_some() {
            ViewState::Selected
        } else if self.hovered.is_some() {
            ViewState::Hover
        } else {
            ViewState::Idle
        }
    }

    /// Convert a viewport point to scene coordinates
    pub fn map_to_scene(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.transform.scroll_x + x / self.transform.scale,
            self.transform.scroll_y + y / self.transform.scale,
        )
    }

    /// Rectangle under a scene point
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.scene.item_at(x, y).map(|item| item.node)
    }

    /// Select the rectangle under a viewport point
    pub fn click_at(&mut self, x: f64, y: f64) -> Option<SelectionOutcome> {
        let (sx, sy) = self.map_to_scene(x, y);
        let node = self.node_at(sx, sy)?;
        self.select(node)
    }

    /// Make `node` the single selection
    ///
    /// Emits one [`ViewEvent::StackSelected`] per contributing stack and
    /// repaints only the previous and the new border.
    pub fn select(&mut self, node: NodeId) -> Option<SelectionOutcome> {
        self.scene.item(node)?;

        let mut outcome = SelectionOutcome::default();
        if let Some(old) = self.selected.replace(node) {
            if old != node && self.scene.set_pen(old, Pen::Normal) {
                outcome.repainted.push(old);
            }
        }
        self.scene.set_pen(node, Pen::Selected);
        outcome.repainted.push(node);

        let tree_node = self.tree.node(node)?;
        outcome.events = tree_node
            .stack_ids
            .iter()
            .map(|id| ViewEvent::StackSelected(id.clone()))
            .collect();

        let allocations = node_allocations(tree_node, &self.alloc_counts);
        debug!("Selected '{}' ({} stacks)", tree_node.name, outcome.events.len());
        self.status.text = format!(
            "Function: {}\nSize: {}\nAllocations: {}",
            tree_node.name,
            format_mb(tree_node.total),
            allocations
        );
        self.status.visible = true;
        self.place_status();

        Some(outcome)
    }

    /// Drop the selection and hide the status overlay
    pub fn clear_selection(&mut self) -> Vec<NodeId> {
        self.status.visible = false;
        match self.selected.take() {
            Some(old) if self.scene.set_pen(old, Pen::Normal) => vec![old],
            _ => Vec::new(),
        }
    }

    fn place_status(&mut self) {
        self.status.x = self.viewport.width - StatusOverlay::WIDTH - STATUS_MARGIN;
        self.status.y = if self.reverse_stack {
            self.viewport.height - StatusOverlay::HEIGHT - STATUS_MARGIN
        } else {
            STATUS_MARGIN
        };
    }

    /// Track the pointer; returns a tooltip when over a rectangle
    pub fn hover(&mut self, x: f64, y: f64) -> Option<HoverInfo> {
        let (sx, sy) = self.map_to_scene(x, y);
        self.hovered = self.node_at(sx, sy);
        let id = self.hovered?;

        let node = self.tree.node(id)?;
        let tooltip = self.scene.item(id)?.tooltip.clone();
        Some(HoverInfo {
            node: id,
            tooltip,
            event: ViewEvent::Hovered {
                name: node.name.clone(),
                self_size: self.tree.self_size(id),
                total_size: node.total,
            },
        })
    }

    pub fn leave(&mut self) {
        self.hovered = None;
    }

    /// Feed the search box; returns the match count when the search ran
    ///
    /// Empty text clears the search at once.
    pub fn search_input(&mut self, text: &str, now: Instant) -> Option<usize> {
        if text.is_empty() {
            self.clear_search();
            return Some(0);
        }
        let text = self.debouncer.submit(text, now)?;
        Some(self.run_search(&text))
    }

    /// Run a deferred search once it is due
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let text = self.debouncer.poll(now)?;
        Some(self.run_search(&text))
    }

    /// Deadline of the pending search, if any
    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    fn run_search(&mut self, text: &str) -> usize {
        let needle = text.to_lowercase();
        self.scene.restore_fills();
        self.matches = self
            .scene
            .items()
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .map(|item| item.node)
            .collect();
        for node in &self.matches {
            self.scene.set_fill(*node, SEARCH_MATCH);
        }
        self.search_term = text.to_string();
        debug!("Search '{}' matched {} rectangles", text, self.matches.len());
        self.matches.len()
    }

    /// Drop the search and restore every base fill
    pub fn clear_search(&mut self) {
        self.debouncer.cancel();
        self.scene.restore_fills();
        self.matches.clear();
        self.search_term.clear();
    }

    fn current_match(&self) -> Option<usize> {
        let selected = self.selected?;
        self.matches.iter().position(|n| *n == selected)
    }

    /// Jump to the next match, wrapping around
    pub fn next_match(&mut self) -> Option<SelectionOutcome> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let index = self.current_match().map_or(0, |i| (i + 1) % count);
        self.goto_match(index)
    }

    /// Jump to the previous match, wrapping around
    pub fn prev_match(&mut self) -> Option<SelectionOutcome> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        let index = self.current_match().map_or(count - 1, |i| (i + count - 1) % count);
        self.goto_match(index)
    }

    fn goto_match(&mut self, index: usize) -> Option<SelectionOutcome> {
        let node = *self.matches.get(index)?;
        self.center_on(node);
        self.select(node)
    }

    /// Scroll so the rectangle of `node` sits in the middle of the viewport
    pub fn center_on(&mut self, node: NodeId) {
        if let Some(item) = self.scene.item(node) {
            let (cx, cy) = item.center();
            self.transform.scroll_x = cx - self.viewport.width / (2.0 * self.transform.scale);
            self.transform.scroll_y = cy - self.viewport.height / (2.0 * self.transform.scale);
        }
    }

    pub fn begin_pan(&mut self, x: f64, y: f64) {
        self.pan_last = Some((x, y));
    }

    /// Move the scroll offset by the pointer delta
    pub fn pan_to(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.pan_last {
            self.transform.scroll_x -= (x - last_x) / self.transform.scale;
            self.transform.scroll_y -= (y - last_y) / self.transform.scale;
            self.pan_last = Some((x, y));
        }
    }

    pub fn end_pan(&mut self) {
        self.pan_last = None;
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_FACTOR);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / ZOOM_FACTOR);
    }

    /// Scale around the viewport center
    fn zoom_by(&mut self, factor: f64) {
        let (cx, cy) = self.map_to_scene(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.transform.scale *= factor;
        self.transform.scroll_x = cx - self.viewport.width / (2.0 * self.transform.scale);
        self.transform.scroll_y = cy - self.viewport.height / (2.0 * self.transform.scale);
    }

    /// Back to scale 1 and the default scroll edge
    pub fn reset_view(&mut self) {
        self.transform = Transform::default();
        self.scroll_to_anchor();
    }

    /// Fit the whole scene, keeping the aspect ratio
    pub fn fit_view(&mut self) {
        if self.bounds.width <= 0.0 || self.bounds.height <= 0.0 {
            return;
        }
        let scale = (self.viewport.width / self.bounds.width).min(self.viewport.height / self.bounds.height);
        self.transform.scale = scale;
        self.transform.scroll_x = self.bounds.x - (self.viewport.width / scale - self.bounds.width) / 2.0;
        self.transform.scroll_y = self.bounds.y - (self.viewport.height / scale - self.bounds.height) / 2.0;
    }
}
