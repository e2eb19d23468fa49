//! Frame acquisition for the recognizer.
//!
//! - [`FrameSource`] is the "give me the current frame" seam
//! - [`ImageSequenceSource`] replays still images from disk
//! - `CameraSource` streams from a webcam (`camera` feature)
//! - [`FrameFilter`] is the optional pre-filter (saturation, mirror)

#[cfg(feature = "camera")]
mod camera;
mod filter;
mod source;
mod types;

#[cfg(feature = "camera")]
pub use camera::{list_cameras, CameraSettings, CameraSource};
pub use filter::{apply_saturation, mirror_horizontal, FrameFilter};
pub use source::{load_frame, FrameSource, ImageSequenceSource};
pub use types::{CaptureError, Frame, FrameFormat};
