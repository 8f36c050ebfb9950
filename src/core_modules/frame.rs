// THEORY:
// The `frame` module holds the two "dumb" data containers that flow through
// the detection pipeline: the `Frame` a capture device hands us, and the
// `ForegroundMask` the background model derives from it.
//
// Key architectural principles:
// 1.  **Immutability across stages**: A `Frame` is never mutated once built.
//     Every pipeline stage that transforms image data produces a new derived
//     value (a mask, a region list) instead of writing back into its input,
//     which keeps the per-frame data flow auditable.
// 2.  **Single brightness lens**: The background model reasons about one
//     scalar per pixel. `luminance_plane` collapses the RGBA grid into a
//     Rec. 601 luma plane, the same weighting the rest of the vision stack
//     uses for motion work.
// 3.  **Mask labels, not booleans**: The mask distinguishes background,
//     shadow, and foreground with distinct byte labels so downstream stages
//     can choose whether illumination changes count as motion.

use chrono::{DateTime, Utc};

const CHANNELS: usize = 4;

/// Mask label for a pixel consistent with the learned background.
pub const LABEL_BACKGROUND: u8 = 0;
/// Mask label for a pixel that darkened in proportion to the background,
/// i.e. an illumination change rather than an object.
pub const LABEL_SHADOW: u8 = 127;
/// Mask label for a pixel that deviates from the learned background.
pub const LABEL_FOREGROUND: u8 = 255;

/// An immutable RGBA8 image grid with its logical capture timestamp.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Width of the frame in pixels.
    pub width: u32,
    /// Height of the frame in pixels.
    pub height: u32,
    /// Flattened RGBA8 pixel data, row-major, `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// When the frame was captured.
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp: DateTime<Utc>) -> Self {
        assert_eq!(
            data.len(),
            (width * height) as usize * CHANNELS,
            "frame buffer length does not match {width}x{height} RGBA8"
        );
        Self {
            width,
            height,
            data,
            timestamp,
        }
    }

    /// Collapses the RGBA grid into one Rec. 601 luma value per pixel.
    pub fn luminance_plane(&self) -> Vec<f32> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32)
            .collect()
    }
}

/// A per-pixel label grid derived from one frame by the background model.
///
/// Same dimensions as its source frame; consumed immediately by the region
/// extractor and never stored.
#[derive(Debug, Clone)]
pub struct ForegroundMask {
    /// Width of the mask in pixels.
    pub width: u32,
    /// Height of the mask in pixels.
    pub height: u32,
    /// One `LABEL_*` byte per pixel, row-major.
    pub labels: Vec<u8>,
}

impl ForegroundMask {
    pub fn new(width: u32, height: u32, labels: Vec<u8>) -> Self {
        assert_eq!(
            labels.len(),
            (width * height) as usize,
            "mask length does not match {width}x{height}"
        );
        Self {
            width,
            height,
            labels,
        }
    }

    /// Number of pixels labelled foreground (shadow pixels excluded).
    pub fn foreground_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&label| label == LABEL_FOREGROUND)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32, value: u8) -> Frame {
        let data = [value, value, value, 255].repeat((width * height) as usize);
        Frame::new(width, height, data, Utc::now())
    }

    #[test]
    fn luminance_of_gray_is_the_gray_value() {
        let frame = gray_frame(4, 4, 100);
        let plane = frame.luminance_plane();
        assert_eq!(plane.len(), 16);
        for value in plane {
            assert!((value - 100.0).abs() < 0.5);
        }
    }

    #[test]
    fn luminance_weights_green_heaviest() {
        let red = Frame::new(1, 1, vec![255, 0, 0, 255], Utc::now());
        let green = Frame::new(1, 1, vec![0, 255, 0, 255], Utc::now());
        assert!(green.luminance_plane()[0] > red.luminance_plane()[0]);
    }

    #[test]
    fn foreground_count_ignores_shadow_pixels() {
        let labels = vec![
            LABEL_FOREGROUND,
            LABEL_SHADOW,
            LABEL_BACKGROUND,
            LABEL_FOREGROUND,
        ];
        let mask = ForegroundMask::new(2, 2, labels);
        assert_eq!(mask.foreground_count(), 2);
    }
}
