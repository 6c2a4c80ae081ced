//! Stack and allocation dump parsing.
//!
//! This module handles:
//! - Parsing stack dumps into traces keyed by stack id
//! - Parsing allocation dumps into records with frame/stack indices
//! - Defining the parsed record types

pub mod allocation_parser;
pub mod schema;
pub mod stack_parser;

// Re-export main types
pub use allocation_parser::{parse_allocation_file, parse_allocations, AllocationIndex, SizeStatistics};
pub use schema::{AllocationRecord, StackFrame, StackTrace, TraceMap};
pub use stack_parser::{parse_frame_line, parse_stack_file, parse_stacks};
