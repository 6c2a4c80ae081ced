//! Text reports: call tree, timeline and allocation statistics.

use super::flame::{load_session, validate_input};
use super::models::{StatsArgs, TimelineArgs, TreeArgs};
use crate::aggregator::{calculate_hot_stacks, calculate_size_distribution, stack_sizes};
use crate::flamegraph::generate_text_summary;
use crate::output::{write_stats_report, StatsReport};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::format::{format_mb, format_size};
use crate::view::{CallTreeRow, ViewEvent, Viewport};
use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

/// Print the call tree, one indented row per function
pub fn execute_tree(args: TreeArgs) -> Result<()> {
    validate_input(&args.input)?;
    let session = load_session(&args.input, Viewport::default())?;

    let rows: Vec<&CallTreeRow> = session
        .call_tree
        .rows()
        .iter()
        .filter(|row| args.max_depth.map_or(true, |max| row.depth <= max))
        .collect();
    info!("Printing {} call tree rows", rows.len());

    println!("{:<70} {:>12} {:>8}", "Function", "Total Size", "Count");
    println!("{}", "-".repeat(92));
    for row in rows {
        let label = format!("{}{}", "  ".repeat(row.depth), row.label);
        println!("{:<70} {:>12} {:>8}", label, row.size_text, row.count);
    }

    Ok(())
}

/// Print per-frame totals and the summary for a frame range
pub fn execute_timeline(args: TimelineArgs) -> Result<()> {
    validate_input(&args.input)?;
    let mut session = load_session(&args.input, Viewport::default())?;

    if session.timeline.frame_data().is_empty() {
        println!("No frame information in {}", args.input.allocations.display());
        return Ok(());
    }

    for (frame, mb) in session.timeline.points() {
        let bar = "█".repeat((mb * 10.0).round().min(60.0) as usize);
        println!("{:>8} {:>10.1} MB {}", frame, mb, bar);
    }

    let frames: Vec<i64> = match args.range {
        Some((start, end)) => session
            .timeline
            .frame_data()
            .range(start.min(end)..=start.max(end))
            .map(|(frame, _)| *frame)
            .collect(),
        None => session.timeline.frame_data().keys().copied().collect(),
    };
    session.handle_event(&ViewEvent::FramesSelected(frames));
    println!("\n{}", session.status());

    Ok(())
}

/// Print size statistics and hot stacks, optionally writing them as JSON
pub fn execute_stats(args: StatsArgs) -> Result<()> {
    validate_input(&args.input)?;
    if args.top_stacks == 0 {
        anyhow::bail!("top_stacks must be greater than 0");
    }

    let session = load_session(&args.input, Viewport::default())?;
    let traces = session.traces();
    let allocations = session.allocations();

    let sizes = stack_sizes(traces, allocations);
    let statistics = allocations.size_statistics();
    let distribution = calculate_size_distribution(&sizes);
    let hot_stacks = calculate_hot_stacks(traces, &sizes, allocations, args.top_stacks);
    info!("Size distribution: {}", distribution.summary());

    println!("Stacks:        {}", traces.len());
    println!("Allocations:   {}", statistics.total_count);
    println!("Total size:    {}", format_mb(statistics.total_size));
    if let (Some(min), Some(max), Some(avg)) = (statistics.min_size, statistics.max_size, statistics.avg_size) {
        println!(
            "Record size:   min {} / max {} / avg {}",
            format_size(min),
            format_size(max),
            format_size(avg)
        );
    }
    if distribution.is_highly_concentrated() {
        println!("Note: the heaviest 10% of stacks own more than 80% of the bytes");
    }
    println!("\n{}", generate_text_summary(&hot_stacks, args.top_stacks, sizes.len()));

    if let Some(path) = &args.output_json {
        let report = StatsReport {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            stack_count: traces.len(),
            frame_range: (!allocations.frame_totals().is_empty()).then(|| allocations.frame_range()),
            sizes: statistics,
            distribution,
            hot_stacks,
        };
        write_stats_report(&report, path).context("Failed to write statistics JSON")?;
        info!("✓ Statistics written to: {}", path.display());
    }

    Ok(())
}
