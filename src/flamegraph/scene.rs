//! Drawable rectangles built from a laid-out flame tree.
//!
//! The scene is what both the interactive view and the SVG renderer draw:
//! one [`RectItem`] per non-root node with its fill, border, label and
//! tooltip already resolved. Items are indexed by node id so selection and
//! search can restyle single rectangles without rebuilding the scene.

use super::color::{node_color, Rgba, BORDER, HIGHLIGHT, SEARCH_MATCH};
use super::layout::{FlameTree, SceneBounds};
use crate::aggregator::{NodeId, TreeNode};
use crate::utils::config::{LABEL_CHAR_WIDTH, MIN_LABEL_WIDTH, MIN_RECT_WIDTH};
use crate::utils::format::format_mb;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Horizontal padding inside a rectangle before the label starts
const LABEL_PADDING: f64 = 4.0;

/// Allocation record count per stack id
pub type AllocCounts = HashMap<String, usize>;

/// Border style of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pen {
    Normal,
    Selected,
}

impl Pen {
    pub fn width(self) -> f64 {
        match self {
            Self::Normal => 0.5,
            Self::Selected => 2.0,
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            Self::Normal => BORDER,
            Self::Selected => HIGHLIGHT,
        }
    }
}

/// One drawable flame graph rectangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectItem {
    pub node: NodeId,
    pub x: f64,
    pub y: f64,
    /// Drawn width, never below the minimum rectangle width
    pub width: f64,
    pub height: f64,
    pub name: String,
    /// Color derived from the name
    pub base_fill: Rgba,
    /// Color currently applied (base or search highlight)
    pub fill: Rgba,
    pub pen: Pen,
    /// Visible label, `None` when the rectangle is too narrow
    pub label: Option<String>,
    pub tooltip: String,
    /// Total allocation records under this node
    pub allocations: usize,
    pub size: u64,
}

impl RectItem {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Rectangles of one layout pass
#[derive(Debug, Clone, Default)]
pub struct Scene {
    items: Vec<RectItem>,
    index: HashMap<NodeId, usize>,
    bounds: Option<SceneBounds>,
}

impl Scene {
    /// Build items for every non-root node in depth-first order
    pub fn build(
        tree: &FlameTree,
        bounds: SceneBounds,
        alloc_counts: &AllocCounts,
        selected: Option<NodeId>,
        matches: &HashSet<NodeId>,
    ) -> Self {
        let mut scene = Self {
            items: Vec::with_capacity(tree.len().saturating_sub(1)),
            index: HashMap::with_capacity(tree.len()),
            bounds: Some(bounds),
        };

        if bounds.is_empty() {
            return scene;
        }

        for id in tree.depth_first() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            if node.is_root() {
                continue;
            }

            let slot = node.payload;
            let width = slot.width.max(MIN_RECT_WIDTH);
            let allocations = node_allocations(node, alloc_counts);
            let parent = node.parent.and_then(|p| tree.node(p));
            let base_fill = node_color(&node.name);

            scene.index.insert(id, scene.items.len());
            scene.items.push(RectItem {
                node: id,
                x: slot.x,
                y: slot.y,
                width,
                height: slot.height,
                name: node.name.clone(),
                base_fill,
                fill: if matches.contains(&id) { SEARCH_MATCH } else { base_fill },
                pen: if selected == Some(id) { Pen::Selected } else { Pen::Normal },
                label: get_truncated_name(&node.name, width),
                tooltip: build_tooltip(node, parent, allocations),
                allocations,
                size: node.total,
            });
        }

        scene
    }

    pub fn items(&self) -> &[RectItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn bounds(&self) -> Option<SceneBounds> {
        self.bounds
    }

    pub fn item(&self, node: NodeId) -> Option<&RectItem> {
        self.index.get(&node).map(|i| &self.items[*i])
    }

    fn item_mut(&mut self, node: NodeId) -> Option<&mut RectItem> {
        let i = *self.index.get(&node)?;
        self.items.get_mut(i)
    }

    /// Change one border; returns false when the node has no rectangle
    pub fn set_pen(&mut self, node: NodeId, pen: Pen) -> bool {
        match self.item_mut(node) {
            Some(item) => {
                item.pen = pen;
                true
            }
            None => false,
        }
    }

    pub fn set_fill(&mut self, node: NodeId, fill: Rgba) {
        if let Some(item) = self.item_mut(node) {
            item.fill = fill;
        }
    }

    /// Put every rectangle back on its name color
    pub fn restore_fills(&mut self) {
        for item in &mut self.items {
            item.fill = item.base_fill;
        }
    }

    /// Topmost rectangle under a scene point
    pub fn item_at(&self, x: f64, y: f64) -> Option<&RectItem> {
        self.items.iter().rev().find(|item| item.contains(x, y))
    }
}

/// Allocation records across every stack merged into `node`
pub fn node_allocations<P>(node: &TreeNode<P>, alloc_counts: &AllocCounts) -> usize {
    node.stack_ids
        .iter()
        .map(|id| alloc_counts.get(id).copied().unwrap_or(0))
        .sum()
}

fn build_tooltip<P>(node: &TreeNode<P>, parent: Option<&TreeNode<P>>, allocations: usize) -> String {
    let mut lines = vec![
        format!("Function: {}", node.name),
        format!("Size: {}", format_mb(node.total)),
        format!("Allocations: {}", allocations),
    ];

    if let Some(parent) = parent.filter(|p| !p.is_root()) {
        let share = if parent.total == 0 {
            0.0
        } else {
            node.total as f64 / parent.total as f64 * 100.0
        };
        lines.push(format!("Share of parent: {:.1}%", share));
    }

    if node.stack_ids.len() > 1 {
        lines.push(format!("Merged stacks: {}", node.stack_ids.len()));
    }

    lines.join("\n")
}

/// Label that fits inside `width`, or `None` when the rectangle is too narrow
pub fn get_truncated_name(name: &str, width: f64) -> Option<String> {
    if width <= MIN_LABEL_WIDTH || name.is_empty() {
        return None;
    }

    let char_count = name.chars().count();
    let fits = ((width - 2.0 * LABEL_PADDING) / LABEL_CHAR_WIDTH).floor() as usize;
    if char_count <= fits {
        return Some(name.to_string());
    }

    // room for the ellipsis as well
    let keep = ((width - 5.0 * LABEL_PADDING) / LABEL_CHAR_WIDTH).floor().max(0.0) as usize;
    let truncated: String = name.chars().take(keep).collect();
    Some(format!("{}...", truncated))
}
