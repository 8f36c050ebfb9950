// THEORY:
// The `pipeline` module is the per-frame detection chain. It encapsulates
// BackgroundModel → RegionExtractor → MotionClassifier behind a single call:
// give it a frame, get back a `MotionDecision`. It owns all detection state
// (the background estimate, the frame counter) and nothing about alerting —
// what happens with a decision is the monitor's business.
//
// Warm-up: for the first `warmup_frames` frames the background model has not
// converged and its mask is unreliable. The pipeline still feeds those frames
// to the model (it must learn from them) but forces the decision to "no
// motion" rather than report false positives.

use crate::core_modules::background_model::{BackgroundModel, BackgroundModelConfig};
use crate::core_modules::frame::Frame;
use crate::core_modules::motion_classifier::motion_classifier;
use crate::core_modules::region_extractor::RegionExtractor;
use crate::error::SentinelError;
use tracing::debug;

// Re-export the public decision types for API consumers.
pub use crate::core_modules::motion_classifier::MotionDecision;
pub use crate::core_modules::region_extractor::{BoundingBox, Region};

const DEFAULT_WARMUP_FRAMES: u64 = 30;

/// Configuration for the detection pipeline, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of initial frames during which decisions are suppressed while
    /// the background model converges.
    pub warmup_frames: u64,
    /// Strict minimum area for a region to count as motion.
    pub min_region_area: u32,
    /// Whether shadow-labelled pixels participate in region extraction.
    pub include_shadows: bool,
    /// Background model tuning.
    pub model: BackgroundModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            min_region_area: 500,
            include_shadows: false,
            model: BackgroundModelConfig::default(),
        }
    }
}

/// The per-frame detection chain: background subtraction, mask cleaning,
/// region extraction, and area thresholding.
pub struct DetectionPipeline {
    model: BackgroundModel,
    extractor: RegionExtractor,
    min_region_area: u32,
    warmup_frames: u64,
    frames_processed: u64,
}

impl DetectionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            model: BackgroundModel::new(config.model),
            extractor: RegionExtractor::new(config.include_shadows),
            min_region_area: config.min_region_area,
            warmup_frames: config.warmup_frames,
            frames_processed: 0,
        }
    }

    /// True while the background model is still converging.
    pub fn warming_up(&self) -> bool {
        self.frames_processed < self.warmup_frames
    }

    /// Runs one frame through the full chain and returns the decision.
    ///
    /// Frames must arrive in capture order; the background model is not
    /// reorder-tolerant. A frame whose shape differs from the first frame's
    /// fails with `DimensionMismatch`.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<MotionDecision, SentinelError> {
        let mask = self.model.update(frame)?;

        let warm = self.warming_up();
        self.frames_processed += 1;
        if warm {
            debug!(frame = self.frames_processed, "warm-up frame, decision suppressed");
            return Ok(MotionDecision::quiet(frame.timestamp));
        }

        let regions = self.extractor.extract(&mask);
        let decision = motion_classifier::classify(&regions, self.min_region_area, frame.timestamp);
        debug!(
            frame = self.frames_processed,
            regions = regions.len(),
            significant = decision.significant_regions.len(),
            detected = decision.detected,
            "frame classified"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gray_frame(value: u8) -> Frame {
        Frame::new(64, 64, [value, value, value, 255].repeat(64 * 64), Utc::now())
    }

    fn frame_with_block(base: u8, block: (u32, u32, u32, u32), value: u8) -> Frame {
        let mut data = [base, base, base, 255].repeat(64 * 64);
        let (bx, by, bw, bh) = block;
        for y in by..by + bh {
            for x in bx..bx + bw {
                let offset = ((y * 64 + x) * 4) as usize;
                data[offset] = value;
                data[offset + 1] = value;
                data[offset + 2] = value;
            }
        }
        Frame::new(64, 64, data, Utc::now())
    }

    #[test]
    fn warmup_frames_never_report_motion() {
        let mut pipeline = DetectionPipeline::new(PipelineConfig::default());

        // Wildly varying content: without suppression these would all trip
        // the immature model.
        for index in 0..30u8 {
            let frame = gray_frame(index.wrapping_mul(7));
            let decision = pipeline.process_frame(&frame).unwrap();
            assert!(
                !decision.detected,
                "frame {index} reported motion during warm-up"
            );
        }
        assert!(!pipeline.warming_up());
    }

    #[test]
    fn large_object_after_warmup_is_detected() {
        let mut pipeline = DetectionPipeline::new(PipelineConfig::default());
        for _ in 0..35 {
            pipeline.process_frame(&gray_frame(40)).unwrap();
        }

        // 40x50 block: well above the 500-pixel threshold even after edge
        // smoothing.
        let decision = pipeline
            .process_frame(&frame_with_block(40, (10, 5, 40, 50), 220))
            .unwrap();
        assert!(decision.detected);
        assert_eq!(decision.significant_regions.len(), 1);
    }

    #[test]
    fn small_object_after_warmup_is_ignored() {
        let mut pipeline = DetectionPipeline::new(PipelineConfig::default());
        for _ in 0..35 {
            pipeline.process_frame(&gray_frame(40)).unwrap();
        }

        // 10x10 block: survives cleaning but stays under the area threshold.
        let decision = pipeline
            .process_frame(&frame_with_block(40, (20, 20, 10, 10), 220))
            .unwrap();
        assert!(!decision.detected);
    }

    #[test]
    fn dimension_mismatch_propagates() {
        let mut pipeline = DetectionPipeline::new(PipelineConfig::default());
        pipeline.process_frame(&gray_frame(40)).unwrap();

        let odd = Frame::new(32, 32, [40, 40, 40, 255].repeat(32 * 32), Utc::now());
        assert!(matches!(
            pipeline.process_frame(&odd),
            Err(SentinelError::DimensionMismatch { .. })
        ));
    }
}
