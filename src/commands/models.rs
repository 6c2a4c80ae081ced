use crate::flamegraph::FlamegraphConfig;
use std::path::PathBuf;

/// The pair of dumps every command starts from
#[derive(Debug, Clone, Default)]
pub struct InputArgs {
    /// Stack dump (`hash:` blocks)
    pub stacks: PathBuf,

    /// Allocation dump (`key: value` records)
    pub allocations: PathBuf,
}

/// Arguments for the flame command
#[derive(Debug, Clone)]
pub struct FlameArgs {
    pub input: InputArgs,

    /// Output path for the SVG flame graph (optional)
    pub output_svg: Option<PathBuf>,

    /// Output path for the JSON layout snapshot (optional)
    pub output_json: Option<PathBuf>,

    /// Root on top, graph growing downward
    pub reverse: bool,

    /// Viewport width the layout is fitted to
    pub width: f64,

    /// Highlight functions containing this text
    pub search: Option<String>,

    /// Select the first search match
    pub select_first_match: bool,

    pub flamegraph_config: FlamegraphConfig,

    /// Print a hot stack summary to stdout
    pub print_summary: bool,

    /// Number of stacks in the summary
    pub top_stacks: usize,
}

impl Default for FlameArgs {
    fn default() -> Self {
        Self {
            input: InputArgs::default(),
            output_svg: Some(PathBuf::from("flamegraph.svg")),
            output_json: None,
            reverse: false,
            width: 1220.0,
            search: None,
            select_first_match: false,
            flamegraph_config: FlamegraphConfig::default(),
            print_summary: false,
            top_stacks: 10,
        }
    }
}

/// Arguments for the tree command
#[derive(Debug, Clone, Default)]
pub struct TreeArgs {
    pub input: InputArgs,

    /// Hide rows nested deeper than this
    pub max_depth: Option<usize>,
}

/// Arguments for the timeline command
#[derive(Debug, Clone, Default)]
pub struct TimelineArgs {
    pub input: InputArgs,

    /// Inclusive frame range to summarize
    pub range: Option<(i64, i64)>,
}

/// Arguments for the stats command
#[derive(Debug, Clone)]
pub struct StatsArgs {
    pub input: InputArgs,
    pub top_stacks: usize,
    pub output_json: Option<PathBuf>,
}

impl Default for StatsArgs {
    fn default() -> Self {
        Self {
            input: InputArgs::default(),
            top_stacks: 20,
            output_json: None,
        }
    }
}
