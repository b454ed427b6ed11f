//! Capture Workflow
//!
//! Tracks the two view slots of a capture session and decides, for every
//! tap, whether the tap selects a view or takes the picture.

mod state;
mod workflow;

pub use state::{RetakePolicy, TapAction, ViewState, VIEW_COUNT};
pub use workflow::{CaptureWorkflow, SessionSnapshot, SlotSnapshot};

use thiserror::Error;

/// Workflow errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("View index {0} out of range")]
    InvalidView(usize),

    #[error("View {index} cannot be captured in state {state:?}")]
    NotCapturable { index: usize, state: ViewState },
}
