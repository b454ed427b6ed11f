//! Synthetic camera
//!
//! Produces a deterministic gradient at the requested resolution. Used when no
//! hardware device is configured, and as the device double in tests.

use crate::device::{CameraDevice, MediaStream};
use crate::frame::VideoFrame;
use crate::{CaptureError, FacingMode, StreamConstraints};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Frame delivery fault to simulate after playback starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameFault {
    /// Frames carry fewer bytes than their dimensions require
    Truncated,
    /// Playback runs but no frame ever arrives
    Stalled,
}

/// Software camera with configurable availability
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    /// Facings this device can serve
    available: Vec<FacingMode>,
    /// Simulate the user refusing permission
    deny_permission: bool,
    /// Simulate a stream that is acquired but cannot play
    fail_playback: bool,
    frame_fault: Option<FrameFault>,
    /// Streams acquired and not yet stopped
    live_streams: Arc<AtomicUsize>,
    /// Streams handed out in total
    requests: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    /// Device with both rear and front cameras
    pub fn new() -> Self {
        Self {
            available: vec![FacingMode::Environment, FacingMode::User],
            deny_permission: false,
            fail_playback: false,
            frame_fault: None,
            live_streams: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Device that only has the given facings (e.g. a laptop webcam)
    pub fn with_facings(facings: &[FacingMode]) -> Self {
        Self {
            available: facings.to_vec(),
            ..Self::new()
        }
    }

    /// Device that rejects every request
    pub fn denied() -> Self {
        Self {
            deny_permission: true,
            ..Self::new()
        }
    }

    /// Device whose streams fail on playback
    pub fn failing_playback() -> Self {
        Self {
            fail_playback: true,
            ..Self::new()
        }
    }

    /// Device whose frames are shorter than their dimensions
    pub fn truncated_frames() -> Self {
        Self {
            frame_fault: Some(FrameFault::Truncated),
            ..Self::new()
        }
    }

    /// Device that plays but never delivers a frame
    pub fn stalled_frames() -> Self {
        Self {
            frame_fault: Some(FrameFault::Stalled),
            ..Self::new()
        }
    }

    /// Streams currently holding the device
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    /// Number of `request_stream` calls made
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for SyntheticCamera {
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.deny_permission {
            debug!("Synthetic camera: permission denied");
            return Err(CaptureError::PermissionDenied);
        }
        if !self.available.contains(&constraints.facing) {
            return Err(CaptureError::Unavailable(format!("{:?}", constraints.facing)));
        }

        self.live_streams.fetch_add(1, Ordering::SeqCst);
        info!(
            "Synthetic stream acquired: {:?} {}x{}",
            constraints.facing, constraints.ideal_width, constraints.ideal_height
        );

        Ok(Box::new(SyntheticStream {
            width: constraints.ideal_width,
            height: constraints.ideal_height,
            playing: false,
            live: true,
            fail_playback: self.fail_playback,
            frame_fault: self.frame_fault,
            sequence: AtomicU32::new(0),
            started: Instant::now(),
            live_streams: Arc::clone(&self.live_streams),
        }))
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    playing: bool,
    live: bool,
    fail_playback: bool,
    frame_fault: Option<FrameFault>,
    sequence: AtomicU32,
    started: Instant,
    live_streams: Arc<AtomicUsize>,
}

impl MediaStream for SyntheticStream {
    fn start_playback(&mut self) -> Result<(), CaptureError> {
        if !self.live {
            return Err(CaptureError::Stopped);
        }
        if self.fail_playback {
            return Err(CaptureError::Playback("synthetic playback failure".to_string()));
        }
        self.playing = true;
        Ok(())
    }

    fn read_frame(&self) -> Result<VideoFrame, CaptureError> {
        if !self.live {
            return Err(CaptureError::Stopped);
        }
        if !self.playing || self.frame_fault == Some(FrameFault::Stalled) {
            return Err(CaptureError::NotReady);
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let (w, h) = (self.width.max(1), self.height.max(1));
        let mut data = Vec::with_capacity(w as usize * h as usize * 3);
        for y in 0..h {
            for x in 0..w {
                data.push((x * 255 / w) as u8);
                data.push((y * 255 / h) as u8);
                data.push((sequence % 256) as u8);
            }
        }
        if self.frame_fault == Some(FrameFault::Truncated) {
            data.truncate(5);
        }

        Ok(VideoFrame::new(
            data,
            w,
            h,
            self.started.elapsed().as_nanos() as u64,
            sequence,
        ))
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.playing = false;
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
            debug!("Synthetic stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
