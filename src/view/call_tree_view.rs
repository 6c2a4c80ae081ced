//! Call tree list view.
//!
//! Same corpus as the flame graph, merged on `module::function` and walked
//! root first. Only stacks that actually allocated appear. Rows are the
//! tree flattened depth-first with the heaviest child first.

use super::events::ViewEvent;
use crate::aggregator::{build_merge_tree, stack_sizes, MergeOptions, MergeTree, NodeId, TreeNode};
use crate::parser::{AllocationIndex, StackFrame, TraceMap};
use crate::utils::format::format_size;
use log::debug;
use serde::Serialize;

/// One visible line of the call tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallTreeRow {
    #[serde(skip)]
    pub node: NodeId,
    /// Nesting level, 0 for top-level callers
    pub depth: usize,
    /// `function [source]`, or just the function
    pub label: String,
    pub size: u64,
    pub size_text: String,
    /// Number of stacks merged into this row
    pub count: usize,
    pub tooltip: String,
    pub stack_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CallTreeView {
    tree: MergeTree<()>,
    rows: Vec<CallTreeRow>,
}

impl CallTreeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_data(&mut self, traces: &TraceMap, allocations: &AllocationIndex) {
        let sizes = stack_sizes(traces, allocations);
        self.tree = build_merge_tree(traces, &sizes, MergeOptions::call_tree());
        self.rows = self
            .tree
            .depth_first()
            .into_iter()
            .filter_map(|id| self.tree.node(id).map(|node| (id, node)))
            .filter_map(|(id, node)| row_for(id, node))
            .collect();
        debug!("Call tree has {} rows", self.rows.len());
    }

    pub fn tree(&self) -> &MergeTree<()> {
        &self.tree
    }

    pub fn rows(&self) -> &[CallTreeRow] {
        &self.rows
    }

    /// Rows shown with only the first level expanded
    pub fn top_level_rows(&self) -> impl Iterator<Item = &CallTreeRow> {
        self.rows.iter().filter(|row| row.depth <= 1)
    }

    /// Select a row; emits its first contributing stack id
    pub fn select_row(&self, index: usize) -> Option<ViewEvent> {
        let row = self.rows.get(index)?;
        row.stack_ids.first().map(|id| ViewEvent::StackSelected(id.clone()))
    }
}

fn row_for(id: NodeId, node: &TreeNode<()>) -> Option<CallTreeRow> {
    let frame = node.frame.as_ref()?;
    Some(CallTreeRow {
        node: id,
        depth: node.depth - 1,
        label: frame_label(frame),
        size: node.total,
        size_text: format_size(node.total),
        count: node.count,
        tooltip: row_tooltip(frame, node),
        stack_ids: node.stack_ids.iter().cloned().collect(),
    })
}

fn frame_label(frame: &StackFrame) -> String {
    match &frame.source_info {
        Some(source) => format!("{} [{}]", frame.function, source),
        None => frame.function.clone(),
    }
}

fn row_tooltip(frame: &StackFrame, node: &TreeNode<()>) -> String {
    let mut lines = vec![
        format!("Module: {}", frame.module),
        format!("Function: {}", frame.function),
    ];
    if let Some(source) = &frame.source_info {
        lines.push(format!("Source: {}", source));
    }
    lines.push(format!("Total size: {}", format_size(node.total)));
    lines.push(format!("Allocations: {}", node.count));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_allocations, parse_stacks};
    use pretty_assertions::assert_eq;

    const STACKS: &str = "\
hash:a
0x1000 (game.exe) [render.cpp:88] Renderer::draw
0x2000 (game.exe) main
hash:b
0x1000 (game.exe) [render.cpp:88] Renderer::draw
0x3000 (game.exe) Texture::load
hash:idle
0x9000 (game.exe) idle
";

    fn view() -> CallTreeView {
        let allocations = parse_allocations("size: 2048\nhash: a\n\nsize: 512\nhash: b\n");
        let mut view = CallTreeView::new();
        view.update_data(&parse_stacks(STACKS), &allocations);
        view
    }

    #[test]
    fn test_rows_depth_first() {
        let view = view();
        let labels: Vec<(usize, &str, &str)> = view
            .rows()
            .iter()
            .map(|r| (r.depth, r.label.as_str(), r.size_text.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (0, "Renderer::draw [render.cpp:88]", "2.5 KB"),
                (1, "main", "2.0 KB"),
                (1, "Texture::load", "512 B"),
            ]
        );
        assert_eq!(view.rows()[0].count, 2);
    }

    #[test]
    fn test_zero_size_stacks_are_hidden() {
        let view = view();
        assert!(view.rows().iter().all(|r| r.label != "idle"));
    }

    #[test]
    fn test_select_row_emits_first_stack() {
        let view = view();
        assert_eq!(view.select_row(0), Some(ViewEvent::StackSelected("a".to_string())));
        assert_eq!(view.select_row(2), Some(ViewEvent::StackSelected("b".to_string())));
        assert_eq!(view.select_row(9), None);
    }

    #[test]
    fn test_tooltip_includes_source() {
        let view = view();
        assert_eq!(
            view.rows()[0].tooltip,
            "Module: game.exe\nFunction: Renderer::draw\nSource: render.cpp:88\nTotal size: 2.5 KB\nAllocations: 2"
        );
    }
}
