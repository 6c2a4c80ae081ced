//! Notifications emitted by the views.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ViewEvent {
    /// A stack id was selected; one event per contributing stack
    StackSelected(String),

    /// The pointer moved over a flame rectangle
    Hovered {
        name: String,
        self_size: u64,
        total_size: u64,
    },

    /// Timeline frames were selected, sorted ascending
    FramesSelected(Vec<i64>),
}

impl ViewEvent {
    pub fn stack_id(&self) -> Option<&str> {
        match self {
            Self::StackSelected(id) => Some(id),
            _ => None,
        }
    }
}
