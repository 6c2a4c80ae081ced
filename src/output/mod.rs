//! Output writers for flame graphs and statistics.
//!
//! This module handles writing data to disk:
//! - JSON layout snapshots and statistics reports
//! - SVG flame graphs

pub mod json;
pub mod svg;

// Re-export main functions
pub use json::{read_snapshot, write_snapshot, write_stats_report, FlameSnapshot, SnapshotRect, StatsReport};
pub use svg::write_svg;
