//! Flame command implementation.
//!
//! The flame command:
//! 1. Loads the stack and allocation dumps
//! 2. Lays out the flame graph for the requested width and stack order
//! 3. Applies the search, if any
//! 4. Renders the SVG and/or layout snapshot
//! 5. Writes output files

use super::models::{FlameArgs, InputArgs};
use crate::aggregator::calculate_hot_stacks;
use crate::flamegraph::{generate_flamegraph, generate_text_summary};
use crate::output::{write_snapshot, write_svg, FlameSnapshot};
use crate::session::Session;
use crate::view::Viewport;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the flame command
///
/// # Errors
/// * Unreadable dump files
/// * Empty flame graph when an SVG was requested
/// * File write errors
pub fn execute_flame(args: FlameArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/5: Loading dumps...");
    let mut session = load_session(&args.input, Viewport { width: args.width, ..Viewport::default() })?;

    info!("Step 2/5: Laying out flame graph (reverse: {})...", args.reverse);
    session.flame.set_reverse_stack(args.reverse);
    let bounds = session.flame.bounds();
    debug!(
        "Scene {:.0}x{:.0} with {} rectangles",
        bounds.width,
        bounds.height,
        session.flame.scene().len()
    );

    if let Some(term) = args.search.as_deref().filter(|t| !t.is_empty()) {
        info!("Step 3/5: Searching for '{}'...", term);
        // a fresh view has no search history, so this runs immediately
        let matches = session.flame.search_input(term, Instant::now()).unwrap_or(0);
        info!("{} matching rectangles", matches);
        if args.select_first_match {
            if let Some(outcome) = session.flame.next_match() {
                for event in &outcome.events {
                    session.handle_event(event);
                }
                info!("{}", session.status());
            }
        }
    } else {
        info!("Step 3/5: No search requested");
    }

    let svg_content = if args.output_svg.is_some() {
        info!("Step 4/5: Rendering flame graph...");
        let svg = generate_flamegraph(session.flame.scene(), Some(&args.flamegraph_config))
            .context("Failed to render flame graph")?;
        Some(svg)
    } else {
        info!("Step 4/5: Skipping SVG rendering (not requested)");
        None
    };

    info!("Step 5/5: Writing output files...");
    if let (Some(svg), Some(svg_path)) = (svg_content, &args.output_svg) {
        write_svg(&svg, svg_path).context("Failed to write flame graph SVG")?;
        info!("✓ Flame graph written to: {}", svg_path.display());
    }

    if let Some(json_path) = &args.output_json {
        let snapshot = FlameSnapshot::from_view(&session.flame);
        write_snapshot(&snapshot, json_path).context("Failed to write layout snapshot")?;
        info!("✓ Snapshot written to: {}", json_path.display());
    }

    if args.print_summary {
        let sizes = crate::aggregator::stack_sizes(session.traces(), session.allocations());
        let hot = calculate_hot_stacks(session.traces(), &sizes, session.allocations(), args.top_stacks);
        println!("\n{}", "=".repeat(80));
        println!("ALLOCATION SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Stacks:      {}", session.traces().len());
        println!("Allocations: {}", session.allocations().len());
        println!("\n{}", generate_text_summary(&hot, args.top_stacks, sizes.len()));
        println!("{}", "=".repeat(80));
    }

    info!("Flame completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Load both dumps into a fresh session
pub fn load_session(input: &InputArgs, viewport: Viewport) -> Result<Session> {
    let mut session = Session::new(viewport);
    session.load(&input.stacks, &input.allocations).with_context(|| {
        format!(
            "Failed to load {} and {}",
            input.stacks.display(),
            input.allocations.display()
        )
    })?;
    Ok(session)
}

/// Validate flame arguments before doing any work
pub fn validate_args(args: &FlameArgs) -> Result<()> {
    validate_input(&args.input)?;

    if args.output_svg.is_none() && args.output_json.is_none() && !args.print_summary {
        anyhow::bail!("Nothing to do: request an SVG, a JSON snapshot or a summary");
    }

    if !args.width.is_finite() || args.width <= 0.0 {
        anyhow::bail!("Width must be a positive number");
    }

    if args.top_stacks == 0 {
        anyhow::bail!("top_stacks must be greater than 0");
    }

    if args.top_stacks > 1000 {
        anyhow::bail!("top_stacks is too large (max 1000)");
    }

    if args.select_first_match && args.search.as_deref().map_or(true, str::is_empty) {
        anyhow::bail!("--select-first requires --search");
    }

    Ok(())
}

/// Both dump paths must be set
pub fn validate_input(input: &InputArgs) -> Result<()> {
    if input.stacks.as_os_str().is_empty() {
        anyhow::bail!("Stack dump path cannot be empty");
    }
    if input.allocations.as_os_str().is_empty() {
        anyhow::bail!("Allocation dump path cannot be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> FlameArgs {
        FlameArgs {
            input: InputArgs {
                stacks: PathBuf::from("stacks.txt"),
                allocations: PathBuf::from("allocs.txt"),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_args_valid() {
        assert!(validate_args(&args()).is_ok());
    }

    #[test]
    fn test_validate_args_empty_input() {
        let mut a = args();
        a.input.stacks = PathBuf::new();
        assert!(validate_args(&a).is_err());
    }

    #[test]
    fn test_validate_args_no_output() {
        let a = FlameArgs {
            output_svg: None,
            ..args()
        };
        assert!(validate_args(&a).is_err());
    }

    #[test]
    fn test_validate_args_bad_width() {
        let a = FlameArgs { width: 0.0, ..args() };
        assert!(validate_args(&a).is_err());
    }

    #[test]
    fn test_validate_args_top_stacks_bounds() {
        assert!(validate_args(&FlameArgs { top_stacks: 0, ..args() }).is_err());
        assert!(validate_args(&FlameArgs { top_stacks: 2000, ..args() }).is_err());
    }

    #[test]
    fn test_validate_args_select_needs_search() {
        let a = FlameArgs {
            select_first_match: true,
            ..args()
        };
        assert!(validate_args(&a).is_err());
    }
}
