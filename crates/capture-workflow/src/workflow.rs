//! Capture session state machine

use crate::state::{RetakePolicy, TapAction, ViewState, VIEW_COUNT};
use crate::WorkflowError;
use image_encoder::EncodedImage;
use serde::Serialize;
use tracing::{debug, info};

/// One upload cycle: two slots, their states and the active view
#[derive(Debug, Clone)]
pub struct CaptureWorkflow {
    slots: [Option<EncodedImage>; VIEW_COUNT],
    states: [ViewState; VIEW_COUNT],
    active: usize,
    policy: RetakePolicy,
}

/// Serializable view of one slot
#[derive(Debug, Clone, Serialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub state: ViewState,
    pub active: bool,
    /// Data URI of the captured image
    pub image: Option<String>,
}

/// Serializable view of the whole session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub views: Vec<SlotSnapshot>,
    pub active_view: usize,
    pub upload_ready: bool,
    pub retake_policy: RetakePolicy,
}

impl CaptureWorkflow {
    /// Fresh session: both views unclicked, view 0 active
    pub fn new(policy: RetakePolicy) -> Self {
        Self {
            slots: [None, None],
            states: [ViewState::Unclicked; VIEW_COUNT],
            active: 0,
            policy,
        }
    }

    /// Handle a tap on view `index`
    pub fn tap(&mut self, index: usize) -> Result<TapAction, WorkflowError> {
        let state = *self
            .states
            .get(index)
            .ok_or(WorkflowError::InvalidView(index))?;

        let action = match state {
            ViewState::Unclicked => {
                self.states[index] = ViewState::Preview;
                self.active = index;
                TapAction::Selected(index)
            }
            ViewState::Preview if self.active == index => TapAction::Capture(index),
            ViewState::Preview => {
                self.active = index;
                TapAction::Selected(index)
            }
            ViewState::Captured => match self.policy {
                RetakePolicy::Locked => TapAction::Ignored(index),
                RetakePolicy::AllowRetake if self.active == index => TapAction::Capture(index),
                RetakePolicy::AllowRetake => {
                    self.active = index;
                    TapAction::Selected(index)
                }
            },
        };

        debug!("Tap on view {} in {:?}: {:?}", index, state, action);
        Ok(action)
    }

    /// Store the image produced for a `Capture` action
    pub fn complete_capture(
        &mut self,
        index: usize,
        image: EncodedImage,
    ) -> Result<(), WorkflowError> {
        let state = *self
            .states
            .get(index)
            .ok_or(WorkflowError::InvalidView(index))?;

        let capturable = self.active == index
            && match state {
                ViewState::Preview => true,
                ViewState::Captured => self.policy == RetakePolicy::AllowRetake,
                ViewState::Unclicked => false,
            };
        if !capturable {
            return Err(WorkflowError::NotCapturable { index, state });
        }

        self.slots[index] = Some(image);
        self.states[index] = ViewState::Captured;
        info!("View {} captured", index + 1);

        // Advance only to a view that still needs a photo
        if index == 0 && self.states[1] != ViewState::Captured {
            self.active = 1;
        }
        Ok(())
    }

    /// Both slots hold an image
    pub fn is_upload_ready(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Both images, or `None` if a slot is empty
    pub fn upload_images(&self) -> Option<[EncodedImage; VIEW_COUNT]> {
        match &self.slots {
            [Some(a), Some(b)] => Some([a.clone(), b.clone()]),
            _ => None,
        }
    }

    /// Back to the initial session
    pub fn reset(&mut self) {
        self.slots = [None, None];
        self.states = [ViewState::Unclicked; VIEW_COUNT];
        self.active = 0;
        debug!("Capture session reset");
    }

    pub fn state(&self, index: usize) -> Option<ViewState> {
        self.states.get(index).copied()
    }

    pub fn image(&self, index: usize) -> Option<&EncodedImage> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn active_view(&self) -> usize {
        self.active
    }

    pub fn policy(&self) -> RetakePolicy {
        self.policy
    }

    /// Copy of the session for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        let views = (0..VIEW_COUNT)
            .map(|index| SlotSnapshot {
                index,
                state: self.states[index],
                active: self.active == index,
                image: self.slots[index].as_ref().map(|i| i.data_uri.clone()),
            })
            .collect();

        SessionSnapshot {
            views,
            active_view: self.active,
            upload_ready: self.is_upload_ready(),
            retake_policy: self.policy,
        }
    }
}

impl Default for CaptureWorkflow {
    fn default() -> Self {
        Self::new(RetakePolicy::default())
    }
}
