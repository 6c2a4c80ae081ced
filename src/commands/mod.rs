//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the library components to perform user tasks.

pub mod flame;
pub mod models;
pub mod report;
pub mod utils;

// Re-export main command functions
pub use flame::{execute_flame, load_session, validate_args};
pub use models::{FlameArgs, InputArgs, StatsArgs, TimelineArgs, TreeArgs};
pub use report::{execute_stats, execute_timeline, execute_tree};
pub use utils::{display_version, validate_snapshot_file};
