//! Interactive views over a loaded corpus.
//!
//! This module provides:
//! - The flame graph view (selection, hover, search, pan and zoom)
//! - The call tree list view
//! - The per-frame timeline
//! - The events they emit

pub mod call_tree_view;
pub mod events;
pub mod flame_view;
pub mod search;
pub mod timeline;

// Re-export main types
pub use call_tree_view::{CallTreeRow, CallTreeView};
pub use events::ViewEvent;
pub use flame_view::{FlameView, HoverInfo, SelectionOutcome, StatusOverlay, Transform, ViewState, Viewport};
pub use search::SearchDebouncer;
pub use timeline::TimelineView;
