//! Pre-classification frame filters.

use std::fmt;

use super::types::Frame;

/// Rec. 709 luminance weights, as used by common GPU saturation shaders.
const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// A single named filter applied to a frame before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameFilter {
    /// Mix between grayscale (0.0) and the original colours (1.0).
    /// Values above 1.0 oversaturate.
    Saturation(f32),
    /// Flip left-right (selfie mode for front cameras)
    Mirror,
}

impl FrameFilter {
    /// Parse a filter name such as `saturation`, `saturation=1.4` or `mirror`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (s, None),
        };
        match name.trim().to_lowercase().as_str() {
            "saturation" => {
                let amount = match value {
                    Some(v) => v.trim().parse::<f32>().ok()?,
                    None => 1.0,
                };
                (amount >= 0.0 && amount.is_finite()).then_some(Self::Saturation(amount))
            }
            "mirror" if value.is_none() => Some(Self::Mirror),
            _ => None,
        }
    }

    /// Apply the filter in place.
    pub fn apply(&self, frame: &mut Frame) {
        match *self {
            FrameFilter::Saturation(amount) => apply_saturation(frame, amount),
            FrameFilter::Mirror => mirror_horizontal(frame),
        }
    }
}

impl fmt::Display for FrameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameFilter::Saturation(amount) => write!(f, "saturation={}", amount),
            FrameFilter::Mirror => write!(f, "mirror"),
        }
    }
}

/// Blend every pixel with its luminance.
pub fn apply_saturation(frame: &mut Frame, amount: f32) {
    // 1.0 is the identity; skip the pass entirely.
    if (amount - 1.0).abs() < f32::EPSILON {
        return;
    }
    let bpp = frame.bytes_per_pixel();
    for px in frame.data.chunks_exact_mut(bpp) {
        let rgb = [px[0] as f32, px[1] as f32, px[2] as f32];
        let luma = rgb[0] * LUMA_WEIGHTS[0] + rgb[1] * LUMA_WEIGHTS[1] + rgb[2] * LUMA_WEIGHTS[2];
        for (channel, value) in px.iter_mut().zip(rgb) {
            *channel = (luma + (value - luma) * amount).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut frame.data[row_start..row_start + width * bpp];

        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame::from_rgb(data, width, height).unwrap()
    }

    #[test]
    fn test_saturation_identity_leaves_pixels() {
        let mut f = frame(vec![200, 10, 30, 0, 255, 90], 2, 1);
        FrameFilter::Saturation(1.0).apply(&mut f);
        assert_eq!(f.data, vec![200, 10, 30, 0, 255, 90]);
    }

    #[test]
    fn test_saturation_zero_is_grayscale() {
        let mut f = frame(vec![255, 0, 0], 1, 1);
        FrameFilter::Saturation(0.0).apply(&mut f);
        let [r, g, b] = f.pixel(0, 0);
        assert_eq!(r, g);
        assert_eq!(g, b);
        // 255 * 0.2125 = 54.19
        assert_eq!(r, 54);
    }

    #[test]
    fn test_saturation_gray_pixel_is_stable() {
        let mut f = frame(vec![128, 128, 128], 1, 1);
        FrameFilter::Saturation(2.0).apply(&mut f);
        assert_eq!(f.pixel(0, 0), [128, 128, 128]);
    }

    #[test]
    fn test_oversaturation_clamps() {
        let mut f = frame(vec![250, 10, 10], 1, 1);
        FrameFilter::Saturation(3.0).apply(&mut f);
        let [r, g, b] = f.pixel(0, 0);
        assert_eq!(r, 255);
        assert_eq!(g, 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn test_mirror_horizontal_2x1() {
        let mut f = frame(vec![1, 2, 3, 4, 5, 6], 2, 1);
        FrameFilter::Mirror.apply(&mut f);
        assert_eq!(f.data, vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_mirror_horizontal_3x2() {
        let mut f = frame(
            vec![
                1, 1, 1, 2, 2, 2, 3, 3, 3, // Row 0: A, B, C
                4, 4, 4, 5, 5, 5, 6, 6, 6, // Row 1: D, E, F
            ],
            3,
            2,
        );
        mirror_horizontal(&mut f);
        assert_eq!(
            f.data,
            vec![
                3, 3, 3, 2, 2, 2, 1, 1, 1, // Row 0: C, B, A
                6, 6, 6, 5, 5, 5, 4, 4, 4, // Row 1: F, E, D
            ]
        );
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!(
            FrameFilter::from_str("saturation"),
            Some(FrameFilter::Saturation(1.0))
        );
        assert_eq!(
            FrameFilter::from_str("Saturation=1.5"),
            Some(FrameFilter::Saturation(1.5))
        );
        assert_eq!(FrameFilter::from_str("mirror"), Some(FrameFilter::Mirror));
        assert_eq!(FrameFilter::from_str("saturation=-1"), None);
        assert_eq!(FrameFilter::from_str("saturation=abc"), None);
        assert_eq!(FrameFilter::from_str("mirror=1"), None);
        assert_eq!(FrameFilter::from_str("sepia"), None);
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(FrameFilter::Saturation(1.5).to_string(), "saturation=1.5");
        assert_eq!(FrameFilter::Mirror.to_string(), "mirror");
    }
}
