use allocscope::aggregator::{build_merge_tree, stack_sizes, MergeOptions, MergeTree, StackSizes, ROOT};
use allocscope::parser::{parse_allocations, parse_stacks, TraceMap};
use pretty_assertions::assert_eq;

fn sizes(pairs: &[(&str, u64)]) -> StackSizes {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn flame(traces: &TraceMap, sizes: &StackSizes) -> MergeTree<()> {
    build_merge_tree(traces, sizes, MergeOptions::flame(false))
}

#[test]
fn test_round_trip_aggregation() {
    let traces = parse_stacks("hash:A\nalpha\nhash:B\nbeta\n");
    let allocations = parse_allocations("size: 100\nhash: A\n\nsize: 150\nhash: B\n\nsize: 50\nhash: B\n\nsize: 999\nhash: orphan\n");
    let tree = flame(&traces, &stack_sizes(&traces, &allocations));

    assert_eq!(tree.root().total, 300);
    let totals: Vec<u64> = tree
        .children_by_total(ROOT)
        .iter()
        .map(|c| tree.node(*c).unwrap().total)
        .collect();
    assert_eq!(totals, vec![200, 100]);
}

#[test]
fn test_merge_identity() {
    let traces = parse_stacks("hash:x\nf1\nf2\nf3\nhash:y\nf1\nf2\nf3\n");
    let tree = flame(&traces, &sizes(&[("x", 50), ("y", 70)]));

    assert_eq!(tree.len(), 4);
    let mut current = ROOT;
    for name in ["f1", "f2", "f3"] {
        current = tree.child_by_key(current, name).unwrap();
        let node = tree.node(current).unwrap();
        assert_eq!(node.total, 120);
        assert_eq!(node.count, 2);
        assert_eq!(node.stack_ids.len(), 2);
        assert!(node.children.len() <= 1);
    }
}

#[test]
fn test_divergence_point() {
    let traces = parse_stacks("hash:a\nf1\nf2\nhash:b\nf1\nf3\n");
    let tree = flame(&traces, &sizes(&[("a", 10), ("b", 20)]));

    let f1 = tree.child_by_key(ROOT, "f1").unwrap();
    assert_eq!(tree.node(f1).unwrap().total, 30);
    let f2 = tree.child_by_key(f1, "f2").unwrap();
    let f3 = tree.child_by_key(f1, "f3").unwrap();
    assert_eq!(tree.node(f2).unwrap().total, 10);
    assert_eq!(tree.node(f3).unwrap().total, 20);
}

#[test]
fn test_parent_value_is_sum_of_children() {
    let traces = parse_stacks("hash:a\nm\nx\ny\nhash:b\nm\nx\nz\nhash:c\nm\nw\n");
    let tree = flame(&traces, &sizes(&[("a", 3), ("b", 5), ("c", 7)]));

    for (id, node) in tree.nodes() {
        if !node.is_leaf() {
            let children: u64 = node.children.iter().map(|c| tree.node(*c).unwrap().total).sum();
            assert_eq!(children, node.total, "node {}", id);
        }
    }
}

#[test]
fn test_empty_input() {
    let empty = flame(&TraceMap::new(), &StackSizes::new());
    assert!(empty.is_empty());
    assert_eq!(empty.root().total, 0);

    let traces = parse_stacks("hash:a\nmain\n");
    let no_allocs = build_merge_tree::<()>(&traces, &StackSizes::new(), MergeOptions::call_tree());
    assert!(no_allocs.is_empty());
}

#[test]
fn test_module_qualified_keys_split_same_function() {
    let traces = parse_stacks("hash:a\n0x1 (a.dll) init\nhash:b\n0x2 (b.dll) init\n");
    let list: MergeTree<()> = build_merge_tree(&traces, &sizes(&[("a", 1), ("b", 1)]), MergeOptions::call_tree());
    let merged: MergeTree<()> = build_merge_tree(&traces, &sizes(&[("a", 1), ("b", 1)]), MergeOptions::flame(false));

    assert_eq!(list.root().children.len(), 2);
    assert_eq!(merged.root().children.len(), 1);
}
