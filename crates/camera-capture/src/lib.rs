//! Camera Capture Library
//!
//! Wraps a camera device behind the [`CameraDevice`] service trait:
//! - Requests a live stream, preferring the rear-facing camera
//! - Optionally falls back to the front-facing camera
//! - Exposes the current frame of the bound stream
//! - Stops every track when the adapter is torn down

pub mod adapter;
pub mod device;
pub mod frame;
#[cfg(feature = "device")]
pub mod hardware;
pub mod synthetic;

pub use adapter::FrameCaptureAdapter;
pub use device::{CameraDevice, MediaStream};
pub use frame::VideoFrame;
#[cfg(feature = "device")]
pub use hardware::DeviceCamera;
pub use synthetic::SyntheticCamera;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera matches constraints: {0}")]
    Unavailable(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Frame not ready")]
    NotReady,

    #[error("Stream stopped")]
    Stopped,

    #[error("Camera not initialized")]
    NotInitialized,
}

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear-facing camera
    Environment,
    /// Front-facing camera
    User,
}

/// Constraints passed to [`CameraDevice::request_stream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    /// Ideal width; the device may deliver something else
    pub ideal_width: u32,
    /// Ideal height
    pub ideal_height: u32,
}

impl StreamConstraints {
    /// Rear camera at 1920x1080
    pub fn rear() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }

    /// Same resolution, other camera
    pub fn with_facing(self, facing: FacingMode) -> Self {
        Self { facing, ..self }
    }
}

/// What to do when the preferred stream cannot be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Surface the failure directly
    #[default]
    None,
    /// Retry once with the front-facing camera
    FrontCamera,
}

/// Which [`CameraDevice`] implementation serves the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// Generated gradient frames
    #[default]
    Synthetic,
    /// Physical camera through `nokhwa` (requires the `device` feature)
    Device,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device implementation
    pub backend: CameraBackend,
    /// Index of the rear (environment) camera
    pub device_index: u32,
    /// Index of the front (user) camera, if the machine has one
    pub front_device_index: Option<u32>,
    /// Preferred facing
    pub facing: FacingMode,
    /// Ideal capture width
    pub ideal_width: u32,
    /// Ideal capture height
    pub ideal_height: u32,
    /// Fallback when the preferred camera fails
    pub fallback: FallbackPolicy,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: CameraBackend::Synthetic,
            device_index: 0,
            front_device_index: None,
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
            fallback: FallbackPolicy::None,
        }
    }
}

impl CameraConfig {
    /// Config that retries with the front camera
    pub fn with_front_fallback() -> Self {
        Self {
            fallback: FallbackPolicy::FrontCamera,
            ..Default::default()
        }
    }

    /// Constraints for the preferred stream
    pub fn constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: self.facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }
}

/// Open the configured camera device
pub fn open_camera(config: &CameraConfig) -> Result<Box<dyn CameraDevice>, CaptureError> {
    match config.backend {
        CameraBackend::Synthetic => Ok(Box::new(SyntheticCamera::new())),
        #[cfg(feature = "device")]
        CameraBackend::Device => Ok(Box::new(DeviceCamera::new(
            config.device_index,
            config.front_device_index,
        ))),
        #[cfg(not(feature = "device"))]
        CameraBackend::Device => Err(CaptureError::Unavailable(
            "built without the `device` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_synthetic_by_default() {
        let device = open_camera(&CameraConfig::default()).unwrap();
        let stream = device
            .request_stream(&StreamConstraints::rear())
            .await
            .unwrap();
        assert!(stream.is_live());
    }

    #[cfg(not(feature = "device"))]
    #[test]
    fn test_device_backend_needs_feature() {
        let config = CameraConfig {
            backend: CameraBackend::Device,
            ..Default::default()
        };
        assert!(matches!(
            open_camera(&config).err(),
            Some(CaptureError::Unavailable(_))
        ));
    }
}
