//! allocscope
//!
//! Memory allocation flame graphs built from a stack dump and an
//! allocation dump.
//!
//! The pipeline is:
//! - [`parser`] reads both dumps
//! - [`aggregator`] merges stacks into weighted trees
//! - [`flamegraph`] lays the tree out and renders it
//! - [`view`] adds selection, hover, search and navigation on top
//! - [`session`] ties the views to a loaded corpus
//!
//! This crate also backs the `allocscope` CLI:
//!
//! ```bash
//! allocscope flame --stacks stacks.txt --allocs allocs.txt -o flame.svg
//! allocscope --help
//! ```

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod session;
pub mod utils;
pub mod view;
