//! JSON output: flame layout snapshots and allocation statistics.
//!
//! A snapshot records exactly what the flame view drew (bounds and every
//! rectangle) so it can be diffed or validated without re-parsing dumps.

use crate::aggregator::{HotStack, SizeDistribution};
use crate::flamegraph::{Pen, SceneBounds};
use crate::parser::SizeStatistics;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use crate::view::FlameView;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One rectangle as drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRect {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub size: u64,
    pub allocations: usize,
    /// CSS fill color
    pub fill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub selected: bool,
}

/// Serialized state of a laid-out flame view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlameSnapshot {
    pub version: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub reverse_stack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    pub bounds: SceneBounds,
    pub rects: Vec<SnapshotRect>,
}

impl FlameSnapshot {
    pub fn from_view(view: &FlameView) -> Self {
        let matches: HashSet<_> = view.matches().iter().copied().collect();
        let rects = view
            .scene()
            .items()
            .iter()
            .map(|item| SnapshotRect {
                name: item.name.clone(),
                x: item.x,
                y: item.y,
                width: item.width,
                height: item.height,
                size: item.size,
                allocations: item.allocations,
                fill: item.fill.to_css(),
                label: item.label.clone(),
                matched: matches.contains(&item.node),
                selected: item.pen == Pen::Selected,
            })
            .collect();

        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            reverse_stack: view.reverse_stack(),
            search_term: Some(view.search_term().to_string()).filter(|s| !s.is_empty()),
            bounds: view.bounds(),
            rects,
        }
    }

    /// Sum of the widths of rectangles on the row closest to the root
    pub fn root_row_width(&self) -> f64 {
        let edge = if self.reverse_stack {
            self.rects.iter().map(|r| r.y).fold(f64::INFINITY, f64::min)
        } else {
            self.rects.iter().map(|r| r.y).fold(f64::NEG_INFINITY, f64::max)
        };
        self.rects.iter().filter(|r| r.y == edge).map(|r| r.width).sum()
    }
}

/// Allocation statistics written by the `stats` command
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub version: String,
    pub generated_at: String,
    pub stack_count: usize,
    pub sizes: SizeStatistics,
    pub distribution: SizeDistribution,
    pub frame_range: Option<(i64, i64)>,
    pub hot_stacks: Vec<HotStack>,
}

/// Write a flame snapshot as pretty JSON
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_snapshot(snapshot: &FlameSnapshot, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(snapshot, output_path.as_ref())?;
    debug!("Snapshot holds {} rectangles", snapshot.rects.len());
    Ok(())
}

/// Write a statistics report as pretty JSON
pub fn write_stats_report(report: &StatsReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(report, output_path.as_ref())
}

fn write_json<T: Serialize>(value: &T, output_path: &Path) -> Result<(), OutputError> {
    info!("Writing JSON to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;

    info!("JSON written successfully ({} bytes)", file_size(output_path));
    Ok(())
}

fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a snapshot back, e.g. for validation
///
/// # Errors
/// * `OutputError::WriteFailed` - file read error (I/O is shared with writes)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_snapshot(input_path: impl AsRef<Path>) -> Result<FlameSnapshot, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading snapshot from: {}", input_path.display());

    let file = File::open(input_path)?;
    let snapshot: FlameSnapshot = serde_json::from_reader(file)?;

    debug!(
        "Snapshot loaded: version {}, {} rectangles",
        snapshot.version,
        snapshot.rects.len()
    );
    Ok(snapshot)
}
