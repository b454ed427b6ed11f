//! Frame Capture Adapter
//!
//! Owns the live stream for the lifetime of the capture screen. Nothing else
//! touches the stream directly; callers read frames through the adapter.

use crate::device::{CameraDevice, MediaStream};
use crate::frame::VideoFrame;
use crate::{CameraConfig, CaptureError, FacingMode, FallbackPolicy};
use tracing::{error, info, warn};

/// Exclusive owner of one acquired camera stream
pub struct FrameCaptureAdapter {
    stream: Option<Box<dyn MediaStream>>,
    facing: FacingMode,
}

impl FrameCaptureAdapter {
    /// Acquire and start a stream.
    ///
    /// Tries the configured facing first, then the fallback if one is
    /// configured. A stream that was acquired but could not start playing is
    /// stopped before the error is returned.
    pub async fn mount(
        device: &dyn CameraDevice,
        config: &CameraConfig,
    ) -> Result<Self, CaptureError> {
        let preferred = config.constraints();

        let (stream, facing) = match device.request_stream(&preferred).await {
            Ok(stream) => (stream, preferred.facing),
            Err(e) => match config.fallback {
                FallbackPolicy::FrontCamera if preferred.facing != FacingMode::User => {
                    warn!("Preferred camera failed ({}), trying front camera", e);
                    let fallback = preferred.with_facing(FacingMode::User);
                    let stream = device.request_stream(&fallback).await.map_err(|e| {
                        error!("Front camera failed: {}", e);
                        e
                    })?;
                    (stream, FacingMode::User)
                }
                _ => {
                    error!("Camera request failed: {}", e);
                    return Err(e);
                }
            },
        };

        // From here on the adapter owns the stream, so every early return
        // drops it and releases the tracks.
        let mut adapter = Self {
            stream: Some(stream),
            facing,
        };

        if let Some(stream) = adapter.stream.as_mut() {
            stream.start_playback()?;
        }

        info!("Camera stream bound ({:?})", facing);
        Ok(adapter)
    }

    /// Read the frame currently on screen
    pub fn current_frame(&self) -> Result<VideoFrame, CaptureError> {
        self.stream
            .as_ref()
            .ok_or(CaptureError::NotInitialized)?
            .read_frame()
    }

    /// Facing of the bound stream
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Whether a stream is bound and running
    pub fn is_live(&self) -> bool {
        self.stream.as_ref().map_or(false, |s| s.is_live())
    }

    /// Stop all tracks and drop the stream
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Camera released");
        }
    }
}

impl Drop for FrameCaptureAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for FrameCaptureAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCaptureAdapter")
            .field("facing", &self.facing)
            .field("live", &self.is_live())
            .finish()
    }
}
