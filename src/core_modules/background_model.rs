// THEORY:
// The `BackgroundModel` is the heart of the temporal analysis layer. It is a
// stateful, learning entity that maintains one adaptive Gaussian estimate of
// "normal" brightness per pixel. Each incoming frame is classified against
// the estimate learned so far, then folded into it, so the model continuously
// adapts to gradual scene changes (daylight drift, auto-exposure) while still
// flagging abrupt ones (an object entering the scene).
//
// Key architectural principles:
// 1.  **Classify first, learn second**: A pixel is judged against the
//     statistics from *before* this frame, then the statistics absorb the new
//     observation. Judging against already-updated statistics would let fast
//     motion launder itself into the background.
// 2.  **Adaptive sensitivity**: The foreground test is a squared deviation
//     against `var_threshold * variance`. Noisy pixels grow a large variance
//     and tolerate more change; quiet pixels stay tightly thresholded.
// 3.  **Bounded variance**: Variance is clamped to a floor and ceiling so a
//     perfectly static pixel never becomes infinitely sensitive and a chaotic
//     one never becomes blind.
// 4.  **Shadow as a separate label**: A pixel that darkened roughly in
//     proportion to its learned brightness is an illumination change, not an
//     object. It gets its own mask label so downstream stages can discard it.
// 5.  **Sequential updates only**: The model is not reorder-tolerant. Frames
//     must be applied in arrival order, which the single-threaded monitor
//     loop guarantees.

use crate::core_modules::frame::{
    ForegroundMask, Frame, LABEL_BACKGROUND, LABEL_FOREGROUND, LABEL_SHADOW,
};
use crate::error::SentinelError;

const INITIAL_VARIANCE: f32 = 15.0;
const MIN_VARIANCE: f32 = 4.0;
const MAX_VARIANCE: f32 = 75.0;
// Shadow band: a darkened pixel whose brightness ratio to the learned
// background falls inside [min, max] is an illumination change.
const SHADOW_RATIO_MIN: f32 = 0.5;
const SHADOW_RATIO_MAX: f32 = 0.95;

/// Tunable behavior for the background model.
#[derive(Debug, Clone)]
pub struct BackgroundModelConfig {
    /// Number of frames contributing to the background estimate. The learning
    /// rate is `1 / min(frames_seen, history)`, so early frames converge fast
    /// and a mature model decays slowly.
    pub history: u32,
    /// Variance multiplier controlling how far a pixel must deviate from its
    /// learned mean before it is marked foreground.
    pub var_threshold: f32,
    /// Whether darkened-in-proportion pixels are labelled shadow instead of
    /// foreground.
    pub detect_shadows: bool,
}

impl Default for BackgroundModelConfig {
    fn default() -> Self {
        Self {
            history: 500,
            var_threshold: 50.0,
            detect_shadows: true,
        }
    }
}

/// A per-pixel adaptive Gaussian estimate of the static scene.
pub struct BackgroundModel {
    config: BackgroundModelConfig,
    /// Established on the first frame; all later frames must match.
    dimensions: Option<(u32, u32)>,
    /// Learned mean luma per pixel.
    mean: Vec<f32>,
    /// Learned luma variance per pixel, clamped to [MIN_VARIANCE, MAX_VARIANCE].
    variance: Vec<f32>,
    frames_seen: u64,
}

impl BackgroundModel {
    pub fn new(config: BackgroundModelConfig) -> Self {
        Self {
            config,
            dimensions: None,
            mean: Vec::new(),
            variance: Vec::new(),
            frames_seen: 0,
        }
    }

    /// Number of frames the model has absorbed so far.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Classifies the frame against the learned background and then folds it
    /// into the estimate, returning the per-pixel foreground mask.
    ///
    /// Fails with `DimensionMismatch` if the frame's shape differs from the
    /// shape established by the first frame; the model never resizes.
    pub fn update(&mut self, frame: &Frame) -> Result<ForegroundMask, SentinelError> {
        let luma = frame.luminance_plane();

        match self.dimensions {
            None => {
                // First frame establishes the grid and seeds the estimate.
                self.dimensions = Some((frame.width, frame.height));
                self.mean = luma.clone();
                self.variance = vec![INITIAL_VARIANCE; luma.len()];
                self.frames_seen = 1;
                return Ok(ForegroundMask::new(
                    frame.width,
                    frame.height,
                    vec![LABEL_BACKGROUND; luma.len()],
                ));
            }
            Some((want_width, want_height)) => {
                if (frame.width, frame.height) != (want_width, want_height) {
                    return Err(SentinelError::DimensionMismatch {
                        want_width,
                        want_height,
                        got_width: frame.width,
                        got_height: frame.height,
                    });
                }
            }
        }

        self.frames_seen += 1;
        let learning_rate = 1.0 / self.frames_seen.min(self.config.history as u64) as f32;

        let mut labels = vec![LABEL_BACKGROUND; luma.len()];
        for (index, &value) in luma.iter().enumerate() {
            let mean = self.mean[index];
            let variance = self.variance[index];
            let deviation = value - mean;

            if deviation * deviation > self.config.var_threshold * variance {
                labels[index] = if self.config.detect_shadows && is_shadow(value, mean) {
                    LABEL_SHADOW
                } else {
                    LABEL_FOREGROUND
                };
            }

            // Fold the observation into the running estimate.
            self.mean[index] = mean + learning_rate * deviation;
            let new_variance = variance + learning_rate * (deviation * deviation - variance);
            self.variance[index] = new_variance.clamp(MIN_VARIANCE, MAX_VARIANCE);
        }

        Ok(ForegroundMask::new(frame.width, frame.height, labels))
    }
}

fn is_shadow(value: f32, mean: f32) -> bool {
    if mean <= f32::EPSILON || value >= mean {
        return false;
    }
    let ratio = value / mean;
    (SHADOW_RATIO_MIN..=SHADOW_RATIO_MAX).contains(&ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gray_frame(width: u32, height: u32, value: u8) -> Frame {
        let data = [value, value, value, 255].repeat((width * height) as usize);
        Frame::new(width, height, data, Utc::now())
    }

    /// Paints a gray frame and overwrites a rectangle with a brighter value.
    fn frame_with_block(
        width: u32,
        height: u32,
        base: u8,
        block: (u32, u32, u32, u32),
        value: u8,
    ) -> Frame {
        let mut data = [base, base, base, 255].repeat((width * height) as usize);
        let (bx, by, bw, bh) = block;
        for y in by..by + bh {
            for x in bx..bx + bw {
                let offset = ((y * width + x) * 4) as usize;
                data[offset] = value;
                data[offset + 1] = value;
                data[offset + 2] = value;
            }
        }
        Frame::new(width, height, data, Utc::now())
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let mut model = BackgroundModel::new(BackgroundModelConfig::default());
        model.update(&gray_frame(8, 8, 50)).unwrap();

        let err = model.update(&gray_frame(8, 6, 50)).unwrap_err();
        assert!(matches!(
            err,
            SentinelError::DimensionMismatch {
                want_width: 8,
                want_height: 8,
                got_width: 8,
                got_height: 6,
            }
        ));
    }

    #[test]
    fn static_scene_converges_to_empty_mask() {
        let mut model = BackgroundModel::new(BackgroundModelConfig::default());
        let frame = gray_frame(16, 16, 80);

        // Identical frames after the first must classify entirely as background.
        for _ in 0..40 {
            let mask = model.update(&frame).unwrap();
            assert_eq!(mask.foreground_count(), 0);
        }
    }

    #[test]
    fn abrupt_bright_object_is_foreground() {
        let mut model = BackgroundModel::new(BackgroundModelConfig::default());
        for _ in 0..30 {
            model.update(&gray_frame(16, 16, 40)).unwrap();
        }

        let intruder = frame_with_block(16, 16, 40, (4, 4, 6, 6), 220);
        let mask = model.update(&intruder).unwrap();
        assert_eq!(mask.foreground_count(), 36);
    }

    #[test]
    fn proportional_darkening_is_labelled_shadow() {
        let mut model = BackgroundModel::new(BackgroundModelConfig::default());
        for _ in 0..30 {
            model.update(&gray_frame(8, 8, 200)).unwrap();
        }

        // 60% of the learned brightness: inside the shadow band.
        let darkened = gray_frame(8, 8, 120);
        let mask = model.update(&darkened).unwrap();
        assert_eq!(mask.foreground_count(), 0);
        assert!(mask.labels.iter().all(|&label| label == LABEL_SHADOW));
    }

    #[test]
    fn shadow_detection_can_be_disabled() {
        let config = BackgroundModelConfig {
            detect_shadows: false,
            ..BackgroundModelConfig::default()
        };
        let mut model = BackgroundModel::new(config);
        for _ in 0..30 {
            model.update(&gray_frame(8, 8, 200)).unwrap();
        }

        let darkened = gray_frame(8, 8, 120);
        let mask = model.update(&darkened).unwrap();
        assert_eq!(mask.foreground_count(), 64);
    }
}
