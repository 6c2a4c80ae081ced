//! Flame graph rectangle layout.
//!
//! Widths are proportional to a node's share of its parent, rows follow
//! structural depth. In the default orientation the root sits on the
//! bottom row and callees rise above it; in reverse-stack mode the root is
//! on top and the graph grows downward. The whole layout is recomputed from
//! scratch whenever the data, the orientation or the viewport width change.

use crate::aggregator::{MergeTree, NodeId, ROOT};
use crate::utils::config::{MIN_TOTAL_WIDTH, ROW_HEIGHT, ROW_SPACING, VIEWPORT_MARGIN};
use log::debug;
use serde::{Deserialize, Serialize};

/// Layout fields attached to every flame graph node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSlot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Visual row after orientation is applied
    pub row: usize,
}

/// Merge tree carrying layout slots
pub type FlameTree = MergeTree<LayoutSlot>;

/// Geometry inputs for [`compute_layout`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub total_width: f64,
    pub row_height: f64,
    pub v_spacing: f64,
    pub reverse: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            total_width: MIN_TOTAL_WIDTH,
            row_height: ROW_HEIGHT,
            v_spacing: ROW_SPACING,
            reverse: false,
        }
    }
}

impl LayoutConfig {
    /// Width derived from the available viewport, never below the minimum
    pub fn for_viewport(viewport_width: f64, reverse: bool) -> Self {
        Self {
            total_width: (viewport_width - VIEWPORT_MARGIN).max(MIN_TOTAL_WIDTH),
            reverse,
            ..Self::default()
        }
    }

    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_spacing(mut self, v_spacing: f64) -> Self {
        self.v_spacing = v_spacing;
        self
    }
}

/// Which scene edge the view scrolls to after a layout pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollAnchor {
    Top,
    Bottom,
}

/// Scene rectangle produced by a layout pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Vertical extent of the drawn rows before the offset pass
    pub min_y: f64,
    pub max_y: f64,
    pub anchor: ScrollAnchor,
    /// Number of drawable (non-root) nodes
    pub node_count: usize,
}

impl SceneBounds {
    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Assign a rectangle to every node and return the scene bounds
///
/// Children are placed left to right, heaviest first. A zero-sized parent
/// gives its children zero width.
pub fn compute_layout(tree: &mut FlameTree, config: &LayoutConfig) -> SceneBounds {
    let max_depth = tree.max_depth();
    let row_pitch = config.row_height + config.v_spacing;

    let mut pending: Vec<(NodeId, f64, f64)> = vec![(ROOT, 0.0, config.total_width)];
    while let Some((id, x, width)) = pending.pop() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        let row = if config.reverse {
            node.depth
        } else {
            max_depth - node.depth
        };
        let parent_total = node.total;

        let mut child_x = x;
        for child in tree.children_by_total(id) {
            let child_total = tree.node(child).map_or(0, |c| c.total);
            let child_width = if parent_total == 0 {
                0.0
            } else {
                width * (child_total as f64 / parent_total as f64)
            };
            pending.push((child, child_x, child_width));
            child_x += child_width;
        }

        if let Some(node) = tree.node_mut(id) {
            node.payload = LayoutSlot {
                x,
                y: row as f64 * row_pitch,
                width,
                height: config.row_height,
                row,
            };
        }
    }

    let bounds = apply_offsets(tree, config);
    debug!(
        "Laid out {} nodes over {} rows (scene {:.0}x{:.0})",
        bounds.node_count,
        max_depth,
        bounds.width,
        bounds.height
    );
    bounds
}

/// Shift rows so the root-anchored edge sits at the scene origin
fn apply_offsets(tree: &mut FlameTree, config: &LayoutConfig) -> SceneBounds {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut node_count = 0;

    for (_, node) in tree.nodes().filter(|(_, n)| !n.is_root()) {
        min_y = min_y.min(node.payload.y);
        max_y = max_y.max(node.payload.y + config.row_height);
        node_count += 1;
    }

    if node_count == 0 {
        min_y = 0.0;
        max_y = config.row_height;
    }

    let scene_height = max_y - min_y + config.row_height;
    let (shift, y, height, anchor) = if config.reverse {
        (
            config.row_height,
            0.0,
            scene_height + config.row_height,
            ScrollAnchor::Top,
        )
    } else {
        (-max_y, -scene_height, scene_height, ScrollAnchor::Bottom)
    };

    let ids: Vec<NodeId> = tree
        .nodes()
        .filter(|(_, n)| !n.is_root())
        .map(|(id, _)| id)
        .collect();
    for id in ids {
        if let Some(node) = tree.node_mut(id) {
            node.payload.y += shift;
        }
    }

    SceneBounds {
        x: 0.0,
        y,
        width: config.total_width,
        height,
        min_y,
        max_y,
        anchor,
        node_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{build_merge_tree, MergeOptions, StackSizes};
    use crate::parser::parse_stacks;

    fn tree(reverse: bool) -> FlameTree {
        let traces = parse_stacks("hash:a\nmain\nload\nhash:b\nmain\nsave\n");
        let sizes: StackSizes = [("a".to_string(), 300u64), ("b".to_string(), 100)]
            .into_iter()
            .collect();
        build_merge_tree(&traces, &sizes, MergeOptions::flame(reverse))
    }

    #[test]
    fn test_root_spans_total_width() {
        let mut t = tree(false);
        compute_layout(&mut t, &LayoutConfig::default());
        assert_eq!(t.root().payload.width, 800.0);
        assert_eq!(t.root().payload.x, 0.0);
    }

    #[test]
    fn test_children_proportional_and_heaviest_first() {
        let mut t = tree(false);
        compute_layout(&mut t, &LayoutConfig::default());

        let main = t.child_by_key(ROOT, "main").unwrap();
        let load = t.child_by_key(main, "load").unwrap();
        let save = t.child_by_key(main, "save").unwrap();

        assert_eq!(t.node(load).unwrap().payload.width, 600.0);
        assert_eq!(t.node(save).unwrap().payload.width, 200.0);
        assert_eq!(t.node(load).unwrap().payload.x, 0.0);
        assert_eq!(t.node(save).unwrap().payload.x, 600.0);
    }

    #[test]
    fn test_normal_mode_bottom_row_at_zero() {
        let mut t = tree(false);
        let bounds = compute_layout(&mut t, &LayoutConfig::default());

        let main = t.child_by_key(ROOT, "main").unwrap();
        let load = t.child_by_key(main, "load").unwrap();
        // rows: load=0, main=1 => y = 0 and 28 before the shift, max_y = 52
        assert_eq!(bounds.max_y, 52.0);
        assert_eq!(t.node(main).unwrap().payload.y, 28.0 - 52.0);
        assert_eq!(t.node(load).unwrap().payload.y, -52.0);
        assert_eq!(bounds.anchor, ScrollAnchor::Bottom);
        assert_eq!(bounds.y, -bounds.height);
        assert_eq!(bounds.height, 52.0 + 24.0);
    }

    #[test]
    fn test_reverse_mode_grows_down() {
        let mut t = tree(true);
        let bounds = compute_layout(&mut t, &LayoutConfig::default().with_spacing(0.0));
        assert_eq!(bounds.anchor, ScrollAnchor::Top);
        assert_eq!(bounds.y, 0.0);

        let load = t.child_by_key(ROOT, "load").unwrap();
        let main = t.child_by_key(load, "main").unwrap();
        assert_eq!(t.node(load).unwrap().payload.row, 1);
        assert_eq!(t.node(load).unwrap().payload.y, 24.0 + 24.0);
        assert_eq!(t.node(main).unwrap().payload.y, 48.0 + 24.0);
    }

    #[test]
    fn test_viewport_width_has_floor() {
        assert_eq!(LayoutConfig::for_viewport(300.0, false).total_width, 800.0);
        assert_eq!(LayoutConfig::for_viewport(1220.0, true).total_width, 1200.0);
    }

    #[test]
    fn test_root_only_tree() {
        let mut t = FlameTree::new();
        let bounds = compute_layout(&mut t, &LayoutConfig::default());
        assert!(bounds.is_empty());
        assert_eq!((bounds.min_y, bounds.max_y), (0.0, 24.0));
    }

    #[test]
    fn test_zero_parent_gives_zero_width() {
        let traces = parse_stacks("hash:z\nidle\nspin\n");
        let sizes: StackSizes = [("z".to_string(), 0u64)].into_iter().collect();
        let mut t: FlameTree = build_merge_tree(&traces, &sizes, MergeOptions::flame(false));
        compute_layout(&mut t, &LayoutConfig::default());
        let idle = t.child_by_key(ROOT, "idle").unwrap();
        assert_eq!(t.node(idle).unwrap().payload.width, 0.0);
    }
}
