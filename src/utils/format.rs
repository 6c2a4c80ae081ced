//! Human-readable byte formatting used by tooltips and status lines.

use super::config::{BYTES_PER_KB, BYTES_PER_MB};

/// Format a byte count as megabytes with one decimal (`"1.5 MB"`)
pub fn format_mb(bytes: u64) -> String {
    format_mb_f64(bytes as f64)
}

/// Same as [`format_mb`] for fractional byte amounts such as averages
pub fn format_mb_f64(bytes: f64) -> String {
    format!("{:.1} MB", bytes / BYTES_PER_MB)
}

/// Format a byte count in the most fitting unit: B, KB or MB
pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;
    if value < BYTES_PER_KB {
        format!("{} B", bytes)
    } else if value < BYTES_PER_MB {
        format!("{:.1} KB", value / BYTES_PER_KB)
    } else {
        format_mb(bytes)
    }
}
