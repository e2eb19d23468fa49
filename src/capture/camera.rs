//! Live webcam frames via nokhwa.
//!
//! The camera is owned by a background thread that keeps decoding frames and
//! parks the newest one in a shared slot. [`CameraSource::capture`] hands out
//! a copy of whatever is in the slot, so a cycle never waits on the camera's
//! frame clock once the stream is warm.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;

use super::filter::{mirror_horizontal, FrameFilter};
use super::source::FrameSource;
use super::types::{CaptureError, Frame};

/// How long `capture` waits for the first frame after the stream opens.
const FIRST_FRAME_WAIT: Duration = Duration::from_secs(1);
const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Which camera to open and how.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Flip frames left-right, as a front camera preview does
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
            mirror: true,
        }
    }
}

enum CameraCommand {
    Stop,
}

type LatestFrame = Arc<Mutex<Option<Frame>>>;

/// Frame source backed by a live camera.
pub struct CameraSource {
    latest: LatestFrame,
    thread: Option<JoinHandle<()>>,
    command_tx: Option<Sender<CameraCommand>>,
    stop_signal: Arc<AtomicBool>,
    settings: CameraSettings,
}

impl std::fmt::Debug for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSource")
            .field("settings", &self.settings)
            .field("streaming", &self.is_streaming())
            .finish_non_exhaustive()
    }
}

impl CameraSource {
    /// Open the camera and start streaming.
    ///
    /// The device is opened on the capture thread; this waits until the
    /// thread reports that the stream is up (or why it isn't).
    pub fn open(settings: CameraSettings) -> Result<Self, CaptureError> {
        let devices = list_cameras()?;
        if !devices.iter().any(|(index, _)| *index == settings.index) {
            return Err(CaptureError::DeviceNotFound(settings.index));
        }

        let latest: LatestFrame = Arc::new(Mutex::new(None));
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = {
            let latest = Arc::clone(&latest);
            let stop = Arc::clone(&stop_signal);
            let settings = settings.clone();
            thread::spawn(move || run_camera_thread(settings, latest, stop, command_rx, ready_tx))
        };

        let mut source = Self {
            latest,
            thread: Some(thread),
            command_tx: Some(command_tx),
            stop_signal,
            settings,
        };

        match ready_rx.recv() {
            Ok(Ok((width, height, fps))) => {
                log::info!(
                    "Camera {} streaming at {}x{} @ {} fps",
                    source.settings.index,
                    width,
                    height,
                    fps
                );
                Ok(source)
            }
            Ok(Err(e)) => {
                source.shutdown();
                Err(e)
            }
            Err(_) => {
                source.shutdown();
                Err(CaptureError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn is_streaming(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn shutdown(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CameraCommand::Stop);
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self, filter: Option<&FrameFilter>) -> Result<Frame, CaptureError> {
        let deadline = Instant::now() + FIRST_FRAME_WAIT;
        let mut frame = loop {
            if let Some(frame) = self.latest_frame() {
                break frame;
            }
            if !self.is_streaming() {
                return Err(CaptureError::StreamFailed("camera thread stopped".to_string()));
            }
            if Instant::now() >= deadline {
                return Err(CaptureError::Failed("no frame from camera yet".to_string()));
            }
            thread::sleep(FRAME_POLL_INTERVAL);
        };

        if let Some(filter) = filter {
            filter.apply(&mut frame);
        }
        Ok(frame)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Indices and names of the cameras the platform backend can see.
pub fn list_cameras() -> Result<Vec<(u32, String)>, CaptureError> {
    let devices =
        nokhwa::query(ApiBackend::Auto).map_err(|e| CaptureError::QueryFailed(e.to_string()))?;
    Ok(devices
        .into_iter()
        .map(|d| (d.index().as_index().unwrap_or(0), d.human_name()))
        .collect())
}

fn run_camera_thread(
    settings: CameraSettings,
    latest: LatestFrame,
    stop: Arc<AtomicBool>,
    commands: Receiver<CameraCommand>,
    ready: Sender<Result<(u32, u32, u32), CaptureError>>,
) {
    let mut camera = match open_camera(&settings) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(CaptureError::StreamFailed(e.to_string())));
        return;
    }

    let resolution = camera.resolution();
    let _ = ready.send(Ok((
        resolution.width(),
        resolution.height(),
        camera.frame_rate(),
    )));

    while !stop.load(Ordering::Relaxed) {
        if let Ok(CameraCommand::Stop) = commands.try_recv() {
            break;
        }

        match camera.frame() {
            Ok(buffer) => {
                if let Some(mut frame) = convert_to_rgb(&buffer) {
                    if settings.mirror {
                        mirror_horizontal(&mut frame);
                    }
                    if let Ok(mut slot) = latest.lock() {
                        *slot = Some(frame);
                    }
                }
            }
            Err(e) => log::debug!("Dropped camera frame: {}", e),
        }

        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
}

/// Try NV12, then MJPEG, then whatever the camera prefers.
fn open_camera(settings: &CameraSettings) -> Result<Camera, CaptureError> {
    let index = CameraIndex::Index(settings.index);
    let wanted = nokhwa::utils::Resolution::new(settings.width, settings.height);
    let attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = String::from("no camera formats to try");
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(camera) => return Ok(camera),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(open_error(&last_error))
}

fn open_error(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if ["permission", "denied", "authorization", "access"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        CaptureError::PermissionDenied
    } else {
        CaptureError::OpenFailed(message.to_string())
    }
}

/// Decode a camera buffer (MJPEG, YUYV, NV12, ...) into an RGB frame.
fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();
    Frame::from_rgb(decoded.into_raw(), resolution.width(), resolution.height()).ok()
}
