//! Hardware camera through `nokhwa`
//!
//! `nokhwa::Camera` is not `Send`, so every stream owns a worker thread. The
//! worker opens the device, keeps the latest decoded frame, and closes the
//! device when the stream is stopped or dropped.

use crate::device::{CameraDevice, MediaStream};
use crate::frame::VideoFrame;
use crate::{CaptureError, FacingMode, StreamConstraints};
use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::{Camera, NokhwaError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

const FRAME_RATE: u32 = 30;
const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Physical cameras addressed by index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCamera {
    rear_index: u32,
    front_index: Option<u32>,
}

impl DeviceCamera {
    pub fn new(rear_index: u32, front_index: Option<u32>) -> Self {
        Self {
            rear_index,
            front_index,
        }
    }

    /// Camera index serving `facing`
    pub fn index_for(&self, facing: FacingMode) -> Option<u32> {
        match facing {
            FacingMode::Environment => Some(self.rear_index),
            FacingMode::User => self.front_index,
        }
    }
}

/// MJPEG format closest to the ideal resolution, decoded to RGB
fn requested_format(constraints: &StreamConstraints) -> RequestedFormat<'static> {
    let format = CameraFormat::new(
        Resolution::new(constraints.ideal_width, constraints.ideal_height),
        FrameFormat::MJPEG,
        FRAME_RATE,
    );
    RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format))
}

fn acquire_error(e: NokhwaError) -> CaptureError {
    let message = e.to_string();
    if message.to_ascii_lowercase().contains("permission") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::Unavailable(message)
    }
}

#[async_trait]
impl CameraDevice for DeviceCamera {
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError> {
        let index = self.index_for(constraints.facing).ok_or_else(|| {
            CaptureError::Unavailable(format!("no {:?} camera configured", constraints.facing))
        })?;
        let format = requested_format(constraints);

        let (ready_tx, ready_rx) = oneshot::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));

        let worker = std::thread::Builder::new()
            .name(format!("camera-{index}"))
            .spawn({
                let latest = Arc::clone(&latest);
                let running = Arc::clone(&running);
                move || run_worker(index, format, ready_tx, command_rx, latest, running)
            })
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Camera {} could not be opened: {}", index, e);
                return Err(e);
            }
            Err(_) => {
                return Err(CaptureError::Unavailable(format!(
                    "camera {index} worker exited"
                )))
            }
        }

        Ok(Box::new(DeviceStream {
            commands: command_tx,
            latest,
            running,
            worker: Some(worker),
            playing: false,
        }))
    }
}

enum Command {
    Play(mpsc::Sender<Result<(), CaptureError>>),
    Stop,
}

fn run_worker(
    index: u32,
    format: RequestedFormat<'static>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
    commands: mpsc::Receiver<Command>,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
) {
    let mut camera = match Camera::new(CameraIndex::Index(index), format) {
        Ok(camera) => camera,
        Err(e) => {
            running.store(false, Ordering::SeqCst);
            let _ = ready.send(Err(acquire_error(e)));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        running.store(false, Ordering::SeqCst);
        return;
    }
    info!("Camera {} acquired", index);

    loop {
        match commands.recv() {
            Ok(Command::Play(reply)) => match camera.open_stream() {
                Ok(()) => {
                    let _ = reply.send(Ok(()));
                    break;
                }
                Err(e) => {
                    let _ = reply.send(Err(CaptureError::Playback(e.to_string())));
                }
            },
            Ok(Command::Stop) | Err(_) => {
                running.store(false, Ordering::SeqCst);
                debug!("Camera {} released before playback", index);
                return;
            }
        }
    }

    let format = camera.camera_format();
    info!(
        "Camera {} streaming {}x{} @ {}fps",
        index,
        format.resolution().width(),
        format.resolution().height(),
        format.frame_rate()
    );

    let started = Instant::now();
    let mut sequence: u32 = 0;
    loop {
        match commands.try_recv() {
            Ok(Command::Stop) | Err(mpsc::TryRecvError::Disconnected) => break,
            Ok(Command::Play(reply)) => {
                let _ = reply.send(Ok(()));
            }
            Err(mpsc::TryRecvError::Empty) => {}
        }

        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        match decoded {
            Ok(image) => {
                let (width, height) = (image.width(), image.height());
                let frame = VideoFrame::new(
                    image.into_raw(),
                    width,
                    height,
                    started.elapsed().as_nanos() as u64,
                    sequence,
                );
                sequence = sequence.wrapping_add(1);
                if let Ok(mut slot) = latest.lock() {
                    *slot = Some(frame);
                }
            }
            Err(e) => {
                warn!("Camera {} frame error: {}", index, e);
                std::thread::sleep(RETRY_DELAY);
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!("Camera {} stop failed: {}", index, e);
    }
    running.store(false, Ordering::SeqCst);
    info!("Camera {} released", index);
}

/// Stream handle; the device stays open until [`MediaStream::stop`]
struct DeviceStream {
    commands: mpsc::Sender<Command>,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    playing: bool,
}

impl MediaStream for DeviceStream {
    fn start_playback(&mut self) -> Result<(), CaptureError> {
        if !self.is_live() {
            return Err(CaptureError::Stopped);
        }

        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(Command::Play(reply_tx))
            .map_err(|_| CaptureError::Stopped)?;
        match reply_rx.recv_timeout(PLAYBACK_TIMEOUT) {
            Ok(result) => result?,
            Err(_) => return Err(CaptureError::Playback("camera did not start".to_string())),
        }

        self.playing = true;
        Ok(())
    }

    fn read_frame(&self) -> Result<VideoFrame, CaptureError> {
        if !self.is_live() {
            return Err(CaptureError::Stopped);
        }
        if !self.playing {
            return Err(CaptureError::NotReady);
        }
        self.latest
            .lock()
            .map_err(|_| CaptureError::NotReady)?
            .clone()
            .ok_or(CaptureError::NotReady)
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.commands.send(Command::Stop);
            if worker.join().is_err() {
                error!("Camera worker panicked");
            }
            self.playing = false;
        }
    }

    fn is_live(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::SeqCst)
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        self.stop();
    }
}
