//! Configuration and constants shared by the layout engine and the views.

use std::time::Duration;

/// Current snapshot schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Marker that opens a trace block in a stack dump
pub const STACK_MARKER: &str = "hash:";

// Flame layout geometry (scene units)
pub const ROW_HEIGHT: f64 = 24.0;
pub const ROW_SPACING: f64 = 4.0;
pub const MIN_TOTAL_WIDTH: f64 = 800.0;
/// Horizontal space reserved for the vertical scrollbar
pub const VIEWPORT_MARGIN: f64 = 20.0;
/// Rectangles are never drawn narrower than this
pub const MIN_RECT_WIDTH: f64 = 1.0;

// Labels
pub const MIN_LABEL_WIDTH: f64 = 30.0;
pub const LABEL_CHAR_WIDTH: f64 = 7.0;

/// Minimum gap between two executed searches (30 per second)
pub const SEARCH_INTERVAL: Duration = Duration::from_micros(33_333);

/// Zoom step applied per wheel notch
pub const ZOOM_FACTOR: f64 = 1.15;

// Status overlay geometry
pub const STATUS_WIDTH: f64 = 250.0;
pub const STATUS_HEIGHT: f64 = 100.0;
pub const STATUS_MARGIN: f64 = 10.0;

pub const BYTES_PER_KB: f64 = 1024.0;
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
