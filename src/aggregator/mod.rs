//! Aggregation of parsed stacks into merge trees and metrics.
//!
//! This module transforms parsed traces and allocations into:
//! - Weighted merge trees (flame graph and call tree list)
//! - Hot stack rankings (top byte consumers)
//! - Size distribution statistics

pub mod merge_tree;
pub mod metrics;

// Re-export main types and functions
pub use merge_tree::{
    build_merge_tree, stack_sizes, FrameKey, MergeOptions, MergeTree, NodeId, StackSizes, TreeNode, ROOT,
};
pub use metrics::{calculate_hot_stacks, calculate_size_distribution, HotStack, SizeDistribution};
