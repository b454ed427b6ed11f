//! Capture screen controller
//!
//! Glues the camera adapter, encoder, workflow and upload client together and
//! turns every failure into a notification.

use camera_capture::{CameraConfig, CameraDevice, CaptureError, FrameCaptureAdapter};
use capture_workflow::{CaptureWorkflow, RetakePolicy, SessionSnapshot, TapAction, WorkflowError};
use image_encoder::{EncodedImage, ImageEncoder};
use notifications::{Notification, Notifier};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use upload::{DeviceInfo, UploadClient, UploadError, UploadReceipt};

pub const CAMERA_ERROR_MESSAGE: &str = "Camera not accessible";
pub const CAPTURE_ERROR_MESSAGE: &str = "Failed to capture image";

/// Everything the capture page renders
#[derive(Debug, Clone, Serialize)]
pub struct ScreenSnapshot {
    pub session: SessionSnapshot,
    pub notification: Option<Notification>,
    pub uploading: bool,
    pub upload_enabled: bool,
    pub camera_live: bool,
}

/// State behind the `/` route
pub struct CaptureScreen {
    camera: StdMutex<Option<FrameCaptureAdapter>>,
    encoder: ImageEncoder,
    workflow: Mutex<CaptureWorkflow>,
    notifier: Arc<Notifier>,
    uploader: UploadClient,
}

impl CaptureScreen {
    /// Mount the screen: acquire the camera and start an empty session.
    ///
    /// A camera failure is reported through the notifier; the screen still
    /// comes up, it just cannot capture.
    pub async fn mount(
        device: &dyn CameraDevice,
        camera: &CameraConfig,
        encoder: ImageEncoder,
        retake: RetakePolicy,
        notifier: Arc<Notifier>,
        uploader: UploadClient,
    ) -> Self {
        let adapter = match FrameCaptureAdapter::mount(device, camera).await {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                error!("Camera unavailable: {}", e);
                notifier.error(CAMERA_ERROR_MESSAGE);
                None
            }
        };

        Self {
            camera: StdMutex::new(adapter),
            encoder,
            workflow: Mutex::new(CaptureWorkflow::new(retake)),
            notifier,
            uploader,
        }
    }

    /// Handle a tap on a view selector
    pub async fn tap(&self, index: usize) -> Result<TapAction, WorkflowError> {
        let mut workflow = self.workflow.lock().await;
        let action = workflow.tap(index)?;

        if let TapAction::Capture(view) = action {
            match self.capture().await {
                Ok(image) => workflow.complete_capture(view, image)?,
                Err(message) => self.notifier.error(message),
            }
        }
        Ok(action)
    }

    /// Read and encode the live frame. Encoding runs off the async workers.
    async fn capture(&self) -> Result<EncodedImage, &'static str> {
        let frame = self.read_frame().map_err(|e| {
            warn!("Frame read failed: {}", e);
            match e {
                CaptureError::NotInitialized | CaptureError::Stopped => CAMERA_ERROR_MESSAGE,
                _ => CAPTURE_ERROR_MESSAGE,
            }
        })?;

        let encoder = self.encoder.clone();
        match tokio::task::spawn_blocking(move || encoder.encode(&frame)).await {
            Ok(Ok(image)) => Ok(image),
            Ok(Err(e)) => {
                warn!("Encoding failed: {}", e);
                Err(CAPTURE_ERROR_MESSAGE)
            }
            Err(e) => {
                error!("Encoder task failed: {}", e);
                Err(CAPTURE_ERROR_MESSAGE)
            }
        }
    }

    fn read_frame(&self) -> Result<camera_capture::VideoFrame, CaptureError> {
        let camera = self.camera.lock().map_err(|_| CaptureError::NotInitialized)?;
        camera
            .as_ref()
            .ok_or(CaptureError::NotInitialized)?
            .current_frame()
    }

    /// Current live frame as JPEG, for the preview on the page
    pub async fn preview_jpeg(&self) -> Option<Vec<u8>> {
        let frame = self.read_frame().ok()?;
        let encoder = self.encoder.clone();
        tokio::task::spawn_blocking(move || encoder.encode(&frame))
            .await
            .ok()?
            .ok()?
            .jpeg_bytes()
    }

    /// Upload both views
    pub async fn upload(&self, device_info: DeviceInfo) -> Result<UploadReceipt, UploadError> {
        self.uploader.submit(&self.workflow, device_info).await
    }

    pub async fn snapshot(&self) -> ScreenSnapshot {
        let session = self.workflow.lock().await.snapshot();
        let uploading = self.uploader.is_uploading();

        ScreenSnapshot {
            upload_enabled: session.upload_ready && !uploading,
            session,
            notification: self.notifier.current(),
            uploading,
            camera_live: self.camera_live(),
        }
    }

    pub fn camera_live(&self) -> bool {
        self.camera
            .lock()
            .map(|c| c.as_ref().map_or(false, FrameCaptureAdapter::is_live))
            .unwrap_or(false)
    }

    /// Stop the camera (screen teardown)
    pub fn release_camera(&self) {
        if let Ok(mut camera) = self.camera.lock() {
            if let Some(mut adapter) = camera.take() {
                adapter.release();
                info!("Capture screen unmounted");
            }
        }
    }
}
