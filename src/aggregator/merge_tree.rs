//! Weighted merge tree keyed by function identity.
//!
//! Every stack is walked from the root; frames that share a calling prefix
//! (by key) land on the same node, which accumulates the stack's size and
//! remembers which stacks passed through it. The flame graph and the call
//! tree list are both built here and differ only in the node payload and
//! the [`MergeOptions`] they use.
//!
//! Nodes live in a flat arena; parent and child links are indices, so a
//! node can look at its parent without owning it.

use crate::parser::{AllocationIndex, StackFrame, TraceMap};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use std::collections::HashMap;

/// Index of a node inside its [`MergeTree`]
pub type NodeId = usize;

/// The root always occupies the first arena slot
pub const ROOT: NodeId = 0;

/// Aggregated size per stack id, in trace order
pub type StackSizes = IndexMap<String, u64>;

/// How a frame is turned into a child key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKey {
    /// Function name only (flame graph)
    Function,
    /// `module::function` (call tree list)
    ModuleQualified,
}

impl FrameKey {
    pub fn key_for(self, frame: &StackFrame) -> String {
        match self {
            Self::Function => frame.function.clone(),
            Self::ModuleQualified => frame.qualified_name(),
        }
    }
}

/// Knobs for [`build_merge_tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub key: FrameKey,
    /// Walk frames last-to-first instead of first-to-last
    pub reverse: bool,
    /// Walk stacks whose aggregated size is zero
    pub include_zero_weight: bool,
}

impl MergeOptions {
    /// Options used by the flame graph
    pub fn flame(reverse: bool) -> Self {
        Self {
            key: FrameKey::Function,
            reverse,
            include_zero_weight: true,
        }
    }

    /// Options used by the call tree list
    pub fn call_tree() -> Self {
        Self {
            key: FrameKey::ModuleQualified,
            reverse: false,
            include_zero_weight: false,
        }
    }
}

/// One function in one calling context
#[derive(Debug, Clone)]
pub struct TreeNode<P> {
    /// Identity among siblings
    pub key: String,

    /// Display name (function name, `"root"` for the root)
    pub name: String,

    /// Frame that created this node; `None` for the root
    pub frame: Option<StackFrame>,

    /// Aggregated size of every stack passing through this node
    pub total: u64,

    /// Number of stacks that contributed
    pub count: usize,

    /// Contributing stack ids, in contribution order
    pub stack_ids: IndexSet<String>,

    /// Distance from the root
    pub depth: usize,

    pub parent: Option<NodeId>,

    /// Children in creation order
    pub children: Vec<NodeId>,

    child_index: HashMap<String, NodeId>,

    /// View-specific data (layout slot for the flame graph)
    pub payload: P,
}

impl<P: Default> TreeNode<P> {
    fn new(key: String, name: String, frame: Option<StackFrame>, depth: usize, parent: Option<NodeId>) -> Self {
        Self {
            key,
            name,
            frame,
            total: 0,
            count: 0,
            stack_ids: IndexSet::new(),
            depth,
            parent,
            children: Vec::new(),
            child_index: HashMap::new(),
            payload: P::default(),
        }
    }

    fn absorb(&mut self, hash_id: &str, size: u64) {
        self.total = self.total.saturating_add(size);
        self.count += 1;
        self.stack_ids.insert(hash_id.to_string());
    }
}

impl<P> TreeNode<P> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena-backed merge tree
#[derive(Debug, Clone)]
pub struct MergeTree<P> {
    nodes: Vec<TreeNode<P>>,
}

impl<P: Default> Default for MergeTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Default> MergeTree<P> {
    /// Tree holding only an empty root
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new("root".to_string(), "root".to_string(), None, 0, None)],
        }
    }

    /// Merge one stack into the tree
    ///
    /// `frames` must already be in walking order.
    pub fn add_stack<'a>(
        &mut self,
        frames: impl IntoIterator<Item = &'a StackFrame>,
        hash_id: &str,
        size: u64,
        key: FrameKey,
    ) {
        self.nodes[ROOT].absorb(hash_id, size);

        let mut current = ROOT;
        for frame in frames {
            let child_key = key.key_for(frame);
            let existing = self.nodes[current].child_index.get(&child_key).copied();
            current = match existing {
                Some(existing) => existing,
                None => self.attach(current, child_key, frame),
            };
            self.nodes[current].absorb(hash_id, size);
        }
    }

    fn attach(&mut self, parent: NodeId, key: String, frame: &StackFrame) -> NodeId {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TreeNode::new(
            key.clone(),
            frame.function.clone(),
            Some(frame.clone()),
            depth,
            Some(parent),
        ));
        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(id);
        parent_node.child_index.insert(key, id);
        id
    }
}

impl<P> MergeTree<P> {
    pub fn root(&self) -> &TreeNode<P> {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode<P>> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<P>> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode<P>)> {
        self.nodes.iter().enumerate()
    }

    /// Children ordered by total, heaviest first; ties keep creation order
    pub fn children_by_total(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.nodes[id].children.clone();
        children.sort_by(|a, b| self.nodes[*b].total.cmp(&self.nodes[*a].total));
        children
    }

    /// Find a direct child by key
    pub fn child_by_key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.nodes.get(id)?.child_index.get(key).copied()
    }

    /// Deepest structural depth over all leaves
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Size not attributed to any child
    pub fn self_size(&self, id: NodeId) -> u64 {
        let node = &self.nodes[id];
        let children = node
            .children
            .iter()
            .fold(0u64, |sum, c| sum.saturating_add(self.nodes[*c].total));
        node.total.saturating_sub(children)
    }

    /// Pre-order walk, children heaviest first
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut pending = vec![ROOT];
        while let Some(id) = pending.pop() {
            order.push(id);
            let mut children = self.children_by_total(id);
            children.reverse();
            pending.extend(children);
        }
        order
    }

    /// Keys from the root down to `id`, root excluded
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut keys = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|i| self.nodes.get(i)) {
            if node.parent.is_some() {
                keys.push(node.key.as_str());
            }
            current = node.parent;
        }
        keys.reverse();
        keys
    }
}

/// Sum allocation sizes per stack id, in order of first allocation
///
/// Only stacks that have at least one record are present; records whose
/// stack id has no trace are dropped. A stack whose records all have size
/// 0 is kept with a total of 0.
pub fn stack_sizes(traces: &TraceMap, allocations: &AllocationIndex) -> StackSizes {
    allocations
        .hash_ids()
        .filter(|hash_id| traces.contains_key(*hash_id))
        .map(|hash_id| (hash_id.clone(), allocations.hash_total_size(hash_id)))
        .collect()
}

/// Merge the stacks named in `sizes` into one tree
///
/// Stacks are processed heaviest first, ties keeping the order of `sizes`,
/// so sibling creation order is reproducible. Ids without a trace are
/// skipped.
pub fn build_merge_tree<P: Default>(
    traces: &TraceMap,
    sizes: &StackSizes,
    options: MergeOptions,
) -> MergeTree<P> {
    let mut tree = MergeTree::new();

    let mut ordered: Vec<(&String, u64)> = sizes.iter().map(|(hash_id, size)| (hash_id, *size)).collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let mut skipped = 0usize;
    for (hash_id, size) in ordered {
        if size == 0 && !options.include_zero_weight {
            skipped += 1;
            continue;
        }
        let Some(trace) = traces.get(hash_id) else {
            continue;
        };
        if options.reverse {
            tree.add_stack(trace.frames.iter().rev(), hash_id, size, options.key);
        } else {
            tree.add_stack(trace.frames.iter(), hash_id, size, options.key);
        }
    }

    debug!(
        "Merged {} stacks into {} nodes ({} zero-size stacks skipped)",
        tree.root().count,
        tree.len(),
        skipped
    );

    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StackTrace;

    fn traces(stacks: &[(&str, &[&str])]) -> TraceMap {
        stacks
            .iter()
            .map(|(id, frames)| {
                let frames = frames.iter().map(|f| StackFrame::bare(*f)).collect();
                (id.to_string(), StackTrace::new(*id, frames))
            })
            .collect()
    }

    fn sizes(pairs: &[(&str, u64)]) -> StackSizes {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_divergence_point() {
        let t = traces(&[("a", &["f1", "f2"]), ("b", &["f1", "f3"])]);
        let tree: MergeTree<()> =
            build_merge_tree(&t, &sizes(&[("a", 10), ("b", 20)]), MergeOptions::flame(false));

        let f1 = tree.child_by_key(ROOT, "f1").unwrap();
        assert_eq!(tree.node(f1).unwrap().total, 30);

        let children = tree.children_by_total(f1);
        let names: Vec<&str> = children.iter().map(|c| tree.node(*c).unwrap().name.as_str()).collect();
        assert_eq!(names, vec!["f3", "f2"]);
        assert_eq!(tree.node(children[0]).unwrap().total, 20);
    }

    #[test]
    fn test_heaviest_stack_created_first() {
        let t = traces(&[("small", &["x"]), ("big", &["y"])]);
        let tree: MergeTree<()> =
            build_merge_tree(&t, &sizes(&[("small", 1), ("big", 9)]), MergeOptions::flame(false));
        let first = tree.root().children[0];
        assert_eq!(tree.node(first).unwrap().name, "y");
    }

    #[test]
    fn test_reverse_walks_leaf_first() {
        let t = traces(&[("a", &["main", "alloc"])]);
        let tree: MergeTree<()> = build_merge_tree(&t, &sizes(&[("a", 5)]), MergeOptions::flame(true));
        let first = tree.root().children[0];
        assert_eq!(tree.node(first).unwrap().name, "alloc");
        assert_eq!(tree.path(tree.len() - 1), vec!["alloc", "main"]);
    }

    #[test]
    fn test_zero_weight_policy() {
        let t = traces(&[("a", &["main"]), ("z", &["idle"])]);
        let s = sizes(&[("a", 5), ("z", 0)]);

        let flame: MergeTree<()> = build_merge_tree(&t, &s, MergeOptions::flame(false));
        assert!(flame.child_by_key(ROOT, "idle").is_some());

        let list: MergeTree<()> = build_merge_tree(&t, &s, MergeOptions::call_tree());
        assert!(list.child_by_key(ROOT, "::idle").is_none());
        assert_eq!(list.root().count, 1);
    }

    #[test]
    fn test_self_size_and_depth() {
        let t = traces(&[("a", &["f1"]), ("b", &["f1", "f2", "f3"])]);
        let tree: MergeTree<()> =
            build_merge_tree(&t, &sizes(&[("a", 4), ("b", 6)]), MergeOptions::flame(false));
        let f1 = tree.child_by_key(ROOT, "f1").unwrap();
        assert_eq!(tree.self_size(f1), 4);
        assert_eq!(tree.max_depth(), 3);
    }

    #[test]
    fn test_depth_first_order() {
        let t = traces(&[("a", &["m", "light"]), ("b", &["m", "heavy"])]);
        let tree: MergeTree<()> =
            build_merge_tree(&t, &sizes(&[("a", 1), ("b", 2)]), MergeOptions::flame(false));
        let names: Vec<&str> = tree
            .depth_first()
            .into_iter()
            .map(|id| tree.node(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "m", "heavy", "light"]);
    }

    #[test]
    fn test_stacks_without_records_are_not_merged() {
        let t = traces(&[("a", &["main", "load"]), ("ghost", &["main", "never_alloc"])]);
        let allocations = crate::parser::parse_allocations("size: 10\nhash: a\n");
        let s = stack_sizes(&t, &allocations);
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["a"]);

        let tree: MergeTree<()> = build_merge_tree(&t, &s, MergeOptions::flame(false));
        let main = tree.child_by_key(ROOT, "main").unwrap();
        assert!(tree.child_by_key(main, "never_alloc").is_none());
        assert_eq!(tree.node(main).unwrap().stack_ids.iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_stack_sizes_follow_allocation_order() {
        let t = traces(&[("first", &["x"]), ("second", &["y"]), ("orphan_free", &["z"])]);
        let allocations =
            crate::parser::parse_allocations("size: 4\nhash: second\n\nsize: 4\nhash: first\n\nsize: 1\nhash: unknown\n");
        let s = stack_sizes(&t, &allocations);
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["second", "first"]);

        // equal sizes keep allocation order
        let tree: MergeTree<()> = build_merge_tree(&t, &s, MergeOptions::flame(false));
        let first_child = tree.root().children[0];
        assert_eq!(tree.node(first_child).unwrap().name, "y");
    }

    #[test]
    fn test_totals_saturate() {
        let t = traces(&[("a", &["main"]), ("b", &["main"])]);
        let tree: MergeTree<()> =
            build_merge_tree(&t, &sizes(&[("a", u64::MAX), ("b", 1)]), MergeOptions::flame(false));
        assert_eq!(tree.root().total, u64::MAX);
        let main = tree.child_by_key(ROOT, "main").unwrap();
        assert_eq!(tree.node(main).unwrap().total, u64::MAX);
    }
}
