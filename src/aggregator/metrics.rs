//! Hot stacks and size distribution over aggregated stack sizes.
//!
//! Hot stacks are the call stacks responsible for the most allocated bytes.
//! These are the primary targets when hunting memory growth.

use super::merge_tree::StackSizes;
use crate::parser::{AllocationIndex, TraceMap};
use log::debug;
use serde::Serialize;

/// A stack ranked by allocated bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotStack {
    pub hash_id: String,

    /// Functions joined outermost first (`main -> load -> malloc`)
    pub call_path: String,

    /// Bytes allocated from this stack
    pub size: u64,

    /// Number of allocation records
    pub allocations: usize,

    /// Percentage of all attributed bytes
    pub percentage: f64,
}

/// Rank stacks by size and keep the top `top_n`
///
/// Ties keep trace order.
pub fn calculate_hot_stacks(
    traces: &TraceMap,
    sizes: &StackSizes,
    allocations: &AllocationIndex,
    top_n: usize,
) -> Vec<HotStack> {
    let total = sizes.values().fold(0u64, |sum, s| sum.saturating_add(*s));
    debug!("Ranking top {} of {} stacks", top_n, sizes.len());

    let mut ranked: Vec<(&String, u64)> = sizes.iter().map(|(h, s)| (h, *s)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(hash_id, size)| HotStack {
            hash_id: hash_id.clone(),
            call_path: traces
                .get(hash_id)
                .map(|t| t.call_path())
                .unwrap_or_default(),
            size,
            allocations: allocations.hash_count(hash_id),
            percentage: percentage_of(size, total),
        })
        .collect()
}

fn percentage_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// How allocated bytes spread over stacks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeDistribution {
    pub total_size: u64,
    pub stack_count: usize,
    pub mean_per_stack: u64,
    pub median_per_stack: u64,
    /// Bytes owned by the heaviest 10% of stacks
    pub top_10_percent_size: u64,
    pub top_10_percent_percentage: f64,
}

impl SizeDistribution {
    /// True when the heaviest 10% of stacks own more than 80% of the bytes
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {} bytes | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_size,
            self.stack_count,
            self.mean_per_stack,
            self.median_per_stack,
            self.top_10_percent_percentage
        )
    }
}

pub fn calculate_size_distribution(sizes: &StackSizes) -> SizeDistribution {
    if sizes.is_empty() {
        return SizeDistribution::default();
    }

    let mut weights: Vec<u64> = sizes.values().copied().collect();
    weights.sort_unstable_by(|a, b| b.cmp(a));

    let total = weights.iter().fold(0u64, |sum, w| sum.saturating_add(*w));
    let count = weights.len();
    let top_count = (count as f64 * 0.1).ceil() as usize;
    let top_size = weights
        .iter()
        .take(top_count)
        .fold(0u64, |sum, w| sum.saturating_add(*w));

    SizeDistribution {
        total_size: total,
        stack_count: count,
        mean_per_stack: total / count as u64,
        median_per_stack: weights[count / 2],
        top_10_percent_size: top_size,
        top_10_percent_percentage: percentage_of(top_size, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_allocations, parse_stacks};

    #[test]
    fn test_calculate_hot_stacks() {
        let traces = parse_stacks("hash:a\nmain\nload\nhash:b\nmain\nsave\n");
        let allocations = parse_allocations("size: 300\nhash: a\n\nsize: 100\nhash: b\n\nsize: 600\nhash: a\n");
        let sizes = crate::aggregator::stack_sizes(&traces, &allocations);

        let hot = calculate_hot_stacks(&traces, &sizes, &allocations, 1);

        assert_eq!(hot.len(), 1);
        assert_eq!(hot[0].hash_id, "a");
        assert_eq!(hot[0].call_path, "main -> load");
        assert_eq!(hot[0].size, 900);
        assert_eq!(hot[0].allocations, 2);
        assert_eq!(hot[0].percentage, 90.0);
    }

    #[test]
    fn test_size_distribution() {
        let sizes: StackSizes = [("s1", 8500u64), ("s2", 1000), ("s3", 250), ("s4", 250)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let dist = calculate_size_distribution(&sizes);

        assert_eq!(dist.total_size, 10000);
        assert_eq!(dist.stack_count, 4);
        assert_eq!(dist.mean_per_stack, 2500);
        assert!(dist.is_highly_concentrated());
    }

    #[test]
    fn test_size_distribution_empty() {
        let dist = calculate_size_distribution(&StackSizes::new());
        assert_eq!(dist.total_size, 0);
        assert_eq!(dist.stack_count, 0);
    }
}
