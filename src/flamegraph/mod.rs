//! Flame graph layout, coloring and rendering.
//!
//! The merge tree is laid out into proportional rectangles, turned into a
//! scene of styled items, and rendered either interactively (see
//! [`crate::view`]) or as a standalone SVG.

pub mod color;
pub mod generator;
pub mod layout;
pub mod scene;

// Re-export main types
pub use color::{node_color, ColorClass, Rgba};
pub use generator::{generate_flamegraph, generate_text_summary, FlamegraphConfig};
pub use layout::{compute_layout, FlameTree, LayoutConfig, LayoutSlot, SceneBounds, ScrollAnchor};
pub use scene::{get_truncated_name, AllocCounts, Pen, RectItem, Scene};
