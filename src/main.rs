//! allocscope CLI
//!
//! Builds memory allocation flame graphs, call trees and per-frame
//! timelines from stack and allocation dumps.

use allocscope::commands::{
    display_version, execute_flame, execute_stats, execute_timeline, execute_tree, validate_args,
    validate_snapshot_file, FlameArgs, InputArgs, StatsArgs, TimelineArgs, TreeArgs,
};
use allocscope::flamegraph::FlamegraphConfig;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// allocscope - memory allocation flame graphs
#[derive(Parser, Debug)]
#[command(name = "allocscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Dump files shared by every analysis command
#[derive(Args, Debug)]
struct DumpFiles {
    /// Stack dump file
    #[arg(short, long, env = "ALLOCSCOPE_STACKS")]
    stacks: PathBuf,

    /// Allocation dump file
    #[arg(short, long, env = "ALLOCSCOPE_ALLOCS")]
    allocs: PathBuf,
}

impl From<DumpFiles> for InputArgs {
    fn from(files: DumpFiles) -> Self {
        Self {
            stacks: files.stacks,
            allocations: files.allocs,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the allocation flame graph
    Flame {
        #[command(flatten)]
        files: DumpFiles,

        /// Output path for the SVG flame graph
        #[arg(short, long, default_value = "flamegraph.svg")]
        output: PathBuf,

        /// Also write the layout as a JSON snapshot
        #[arg(long)]
        json: Option<PathBuf>,

        /// Root on top, callees growing downward
        #[arg(short, long)]
        reverse: bool,

        /// Viewport width in pixels
        #[arg(long, default_value = "1220")]
        width: f64,

        /// Highlight functions whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Select the first search match
        #[arg(long)]
        select_first: bool,

        /// Flame graph title
        #[arg(long)]
        title: Option<String>,

        /// Print hot stack summary to stdout
        #[arg(long)]
        summary: bool,

        /// Number of stacks in the summary
        #[arg(long, default_value = "10")]
        top_stacks: usize,
    },

    /// Print the call tree
    Tree {
        #[command(flatten)]
        files: DumpFiles,

        /// Maximum nesting depth to print
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Print per-frame allocation totals
    Timeline {
        #[command(flatten)]
        files: DumpFiles,

        /// First frame of the summarized range
        #[arg(long, requires = "to")]
        from: Option<i64>,

        /// Last frame of the summarized range
        #[arg(long, requires = "from")]
        to: Option<i64>,
    },

    /// Print allocation statistics and hot stacks
    Stats {
        #[command(flatten)]
        files: DumpFiles,

        /// Number of hot stacks to show
        #[arg(long, default_value = "20")]
        top_stacks: usize,

        /// Write the statistics as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Validate a flame snapshot JSON file
    Validate {
        /// Path to snapshot JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Flame {
            files,
            output,
            json,
            reverse,
            width,
            search,
            select_first,
            title,
            summary,
            top_stacks,
        } => {
            let mut config = FlamegraphConfig::new();
            if let Some(title) = title {
                config = config.with_title(title);
            }
            if let Some(term) = &search {
                config = config.with_subtitle(format!("search: {}", term));
            }

            let args = FlameArgs {
                input: files.into(),
                output_svg: Some(output),
                output_json: json,
                reverse,
                width,
                search,
                select_first_match: select_first,
                flamegraph_config: config,
                print_summary: summary,
                top_stacks,
            };

            validate_args(&args)?;
            execute_flame(args)?;
        }

        Commands::Tree { files, max_depth } => {
            execute_tree(TreeArgs {
                input: files.into(),
                max_depth,
            })?;
        }

        Commands::Timeline { files, from, to } => {
            execute_timeline(TimelineArgs {
                input: files.into(),
                range: from.zip(to),
            })?;
        }

        Commands::Stats {
            files,
            top_stacks,
            json,
        } => {
            execute_stats(StatsArgs {
                input: files.into(),
                top_stacks,
                output_json: json,
            })?;
        }

        Commands::Validate { file } => {
            validate_snapshot_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
