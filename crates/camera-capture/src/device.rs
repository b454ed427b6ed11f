//! Camera device service traits

use crate::frame::VideoFrame;
use crate::{CaptureError, StreamConstraints};
use async_trait::async_trait;

/// A source of live video streams
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request a stream matching `constraints`.
    ///
    /// May prompt for permission on platforms that have one.
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError>;
}

/// An acquired stream. Holds the device until [`MediaStream::stop`] is called.
pub trait MediaStream: Send + Sync {
    /// Begin delivering frames
    fn start_playback(&mut self) -> Result<(), CaptureError>;

    /// Read the frame currently being displayed
    fn read_frame(&self) -> Result<VideoFrame, CaptureError>;

    /// Stop all tracks. Must be idempotent.
    fn stop(&mut self);

    /// Whether any track is still running
    fn is_live(&self) -> bool;
}
