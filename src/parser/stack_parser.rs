//! Stack dump parser.
//!
//! A dump is a sequence of blocks:
//!
//! ```text
//! hash:7f3a
//! 0x00401000 (game.exe) [render.cpp:88] Renderer::draw
//! 0x00402000 (game.exe) main
//! bare_function_name
//! ```
//!
//! Individual lines never fail; only an unreadable file is an error.

use super::schema::{StackFrame, StackTrace, TraceMap};
use crate::utils::config::STACK_MARKER;
use crate::utils::error::ParseError;
use log::{debug, warn};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// `address (module) [source] function`, source and function optional
static FRAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0x[0-9a-fA-F]+)\s+\(([^)]+)\)(?:\s+\[([^\]]+)\])?\s*(.+)?")
        .expect("frame pattern is valid")
});

/// Parse one frame line
///
/// Lines that do not look like `0xADDR (module) ...` become bare frames
/// whose function is the whole trimmed line.
pub fn parse_frame_line(line: &str) -> StackFrame {
    let line = line.trim();

    match FRAME_PATTERN.captures(line) {
        Some(caps) => StackFrame {
            address: caps[1].to_string(),
            module: caps[2].to_string(),
            function: caps
                .get(4)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            source_info: caps.get(3).map(|m| m.as_str().to_string()),
        },
        None => StackFrame::bare(line),
    }
}

/// Parse a stack dump held in memory
pub fn parse_stacks(text: &str) -> TraceMap {
    let mut traces = TraceMap::new();
    let mut current_hash: Option<String> = None;
    let mut current_frames: Vec<StackFrame> = Vec::new();
    let mut orphan_lines = 0usize;

    for line in text.lines() {
        let line = line.trim();

        if let Some(id) = line.strip_prefix(STACK_MARKER) {
            flush_trace(&mut traces, current_hash.take(), &mut current_frames);
            // the id ends at the next ':'
            let id = id.split(':').next().unwrap_or_default();
            current_hash = Some(id.trim().to_string());
        } else if !line.is_empty() {
            if current_hash.is_some() {
                current_frames.push(parse_frame_line(line));
            } else {
                orphan_lines += 1;
            }
        }
    }

    flush_trace(&mut traces, current_hash, &mut current_frames);

    if orphan_lines > 0 {
        warn!("Ignored {} frame lines before the first '{}' marker", orphan_lines, STACK_MARKER);
    }
    debug!("Parsed {} stack traces", traces.len());

    traces
}

/// Parse a stack dump from disk
///
/// # Errors
/// * `ParseError::Unreadable` - the file could not be read
pub fn parse_stack_file(path: impl AsRef<Path>) -> Result<TraceMap, ParseError> {
    let path = path.as_ref();
    debug!("Reading stack dump: {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_stacks(&text))
}

/// Store the block being built, if it has an id and at least one frame
fn flush_trace(traces: &mut TraceMap, hash: Option<String>, frames: &mut Vec<StackFrame>) {
    let frames = std::mem::take(frames);
    let Some(hash) = hash else {
        return;
    };
    if hash.is_empty() || frames.is_empty() {
        debug!("Discarding empty stack block '{}'", hash);
        return;
    }
    // Re-parsed ids overwrite the earlier trace but keep its position.
    traces.insert(hash.clone(), StackTrace::new(hash, frames));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_frame_line() {
        let frame = parse_frame_line("0x7ffd1234 (libgame.so) [engine.cpp:120] Engine::tick");
        assert_eq!(frame.address, "0x7ffd1234");
        assert_eq!(frame.module, "libgame.so");
        assert_eq!(frame.source_info.as_deref(), Some("engine.cpp:120"));
        assert_eq!(frame.function, "Engine::tick");
    }

    #[test]
    fn test_parse_frame_without_source() {
        let frame = parse_frame_line("0xABCDEF (kernel32.dll) HeapAlloc");
        assert_eq!(frame.module, "kernel32.dll");
        assert_eq!(frame.function, "HeapAlloc");
        assert!(frame.source_info.is_none());
    }

    #[test]
    fn test_parse_bare_frame() {
        let frame = parse_frame_line("   operator new   ");
        assert_eq!(frame, StackFrame::bare("operator new"));
    }

    #[test]
    fn test_non_hex_address_falls_back_to_bare() {
        let frame = parse_frame_line("0xZZ (mod) func");
        assert_eq!(frame.function, "0xZZ (mod) func");
        assert!(frame.module.is_empty());
    }

    #[test]
    fn test_blocks_and_trailing_flush() {
        let text = "hash:a\nmain\nalloc\n\nhash:b\nmain\n\nfree\n";
        let traces = parse_stacks(text);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces["a"].frames.len(), 2);
        // blank lines inside a block do not end it
        assert_eq!(traces["b"].call_path(), "main -> free");
    }

    #[test]
    fn test_empty_block_discarded() {
        let traces = parse_stacks("hash:empty\n\nhash:full\nmain\n");
        assert!(!traces.contains_key("empty"));
        assert!(traces.contains_key("full"));
    }

    #[test]
    fn test_duplicate_id_last_wins() {
        let traces = parse_stacks("hash:x\nfirst\nhash:y\nother\nhash:x\nsecond\n");
        assert_eq!(traces["x"].call_path(), "second");
        let keys: Vec<&str> = traces.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_lines_before_first_marker_ignored() {
        let traces = parse_stacks("stray\nhash:a\nmain\n");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces["a"].call_path(), "main");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = parse_stack_file("/definitely/not/here/stacks.txt");
        assert!(matches!(result, Err(ParseError::Unreadable { .. })));
    }

    #[test]
    fn test_stack_id_stops_at_colon() {
        let traces = parse_stacks("hash: a:extra\nmain\n");
        assert_eq!(traces.keys().collect::<Vec<_>>(), vec!["a"]);
    }
}
