//! Parsed record types shared by both dump parsers.
//!
//! These are immutable once a parser hands them out.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stack traces keyed by stack id, in the order they appeared in the dump
pub type TraceMap = IndexMap<String, StackTrace>;

/// One call-stack entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Instruction address (`0x...`), empty for bare frames
    pub address: String,

    /// Module the function lives in, empty for bare frames
    pub module: String,

    /// Function name (identity key for the flame graph)
    pub function: String,

    /// Source location hint (`file.c:42`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_info: Option<String>,
}

impl StackFrame {
    /// Frame made of a function name only
    pub fn bare(function: impl Into<String>) -> Self {
        Self {
            address: String::new(),
            module: String::new(),
            function: function.into(),
            source_info: None,
        }
    }

    /// Module-qualified identity (`module::function`)
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module, self.function)
    }
}

/// A complete call stack identified by its hash id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTrace {
    pub hash_id: String,
    pub frames: Vec<StackFrame>,
}

impl StackTrace {
    pub fn new(hash_id: impl Into<String>, frames: Vec<StackFrame>) -> Self {
        Self {
            hash_id: hash_id.into(),
            frames,
        }
    }

    /// First frame as written in the dump
    pub fn top_frame(&self) -> Option<&StackFrame> {
        self.frames.first()
    }

    /// Function names joined in stack order (`main -> alloc -> malloc`)
    pub fn call_path(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.function.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// A single allocation event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Allocated bytes
    pub size: u64,

    /// Stack id this allocation was made from
    pub hash_id: String,

    pub address: String,

    pub object_type: String,

    /// Frame (time) index, when the dump recorded one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<i64>,
}
