//! Frame sources.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::filter::FrameFilter;
use super::types::{CaptureError, Frame, FrameFormat};

/// File extensions picked up when scanning a directory.
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Something that can hand out "the current frame".
///
/// `capture` may block (camera round-trip, disk I/O). The recognizer runs it on
/// the blocking pool and bounds the wait with a timeout.
pub trait FrameSource: Send + 'static {
    /// Grab the current frame, running it through `filter` first if given.
    fn capture(&mut self, filter: Option<&FrameFilter>) -> Result<Frame, CaptureError>;
}

impl FrameSource for Box<dyn FrameSource> {
    fn capture(&mut self, filter: Option<&FrameFilter>) -> Result<Frame, CaptureError> {
        (**self).capture(filter)
    }
}

/// Cycles through still images on disk, one per capture.
///
/// Stands in for a live camera: every call decodes the next file in the list
/// and wraps around at the end.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    /// Use an explicit list of image files.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self, CaptureError> {
        if paths.is_empty() {
            return Err(CaptureError::NoImages(PathBuf::new()));
        }
        Ok(Self { paths, next: 0 })
    }

    /// Collect every PNG/JPEG in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir).map_err(|e| CaptureError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CaptureError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if is_image_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(CaptureError::NoImages(dir.to_path_buf()));
        }
        log::info!("Loaded {} image(s) from {}", paths.len(), dir.display());
        Ok(Self { paths, next: 0 })
    }

    /// Open a file or a directory of files.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_paths(vec![path.to_path_buf()])
        }
    }

    /// Files in playback order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequenceSource {
    fn capture(&mut self, filter: Option<&FrameFilter>) -> Result<Frame, CaptureError> {
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();

        let mut frame = load_frame(path)?;
        if let Some(filter) = filter {
            filter.apply(&mut frame);
        }
        Ok(frame)
    }
}

/// Decode an image file into an RGB frame.
pub fn load_frame(path: &Path) -> Result<Frame, CaptureError> {
    let image = image::open(path)
        .map_err(|e| CaptureError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgb8();
    let (width, height) = image.dimensions();

    Ok(Frame {
        data: image.into_raw(),
        width,
        height,
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    })
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}
