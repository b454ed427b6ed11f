//! Per-view state

use serde::{Deserialize, Serialize};

/// Number of view slots in a session
pub const VIEW_COUNT: usize = 2;

/// State of one view slot.
///
/// Moves forward only: `Unclicked -> Preview -> Captured`. The only way back
/// is a session reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Unclicked,
    Preview,
    Captured,
}

impl ViewState {
    /// Whether `self -> next` is a legal forward step
    pub fn can_advance_to(self, next: ViewState) -> bool {
        matches!(
            (self, next),
            (ViewState::Unclicked, ViewState::Preview) | (ViewState::Preview, ViewState::Captured)
        )
    }
}

/// Whether a captured view may be taken again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetakePolicy {
    /// Captured views ignore further taps
    #[default]
    Locked,
    /// Tapping a captured view selects it; tapping it again replaces the image
    AllowRetake,
}

/// What a tap asks the caller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "view", rename_all = "snake_case")]
pub enum TapAction {
    /// The view became active; nothing to capture yet
    Selected(usize),
    /// Grab the live frame, encode it and hand it to `complete_capture`
    Capture(usize),
    /// Nothing happens
    Ignored(usize),
}
