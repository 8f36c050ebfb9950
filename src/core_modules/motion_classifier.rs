// THEORY:
// The `motion_classifier` module is the decision point of the detection
// pipeline. It reduces the region list for one frame to a single
// `MotionDecision`: is motion present, and which regions were large enough to
// matter?
//
// Key architectural principles:
// 1.  **Pure function**: Classification has no state and no side effects. The
//     same regions and threshold always produce the same decision, which makes
//     the boundary behavior directly testable.
// 2.  **Strict threshold**: A region qualifies only when its area is strictly
//     greater than `min_area`. A region of exactly `min_area` does not count.
// 3.  **Order preserved**: Significant regions keep the extractor's
//     deterministic ordering.

use crate::core_modules::region_extractor::Region;
use chrono::{DateTime, Utc};

/// The per-frame verdict of the detection pipeline. Immutable once produced.
#[derive(Debug, Clone)]
pub struct MotionDecision {
    /// Whether at least one region qualified as significant.
    pub detected: bool,
    /// The qualifying regions, in extraction order.
    pub significant_regions: Vec<Region>,
    /// Capture timestamp of the frame this decision describes.
    pub timestamp: DateTime<Utc>,
}

impl MotionDecision {
    /// A "nothing happened" decision for the given instant.
    pub fn quiet(timestamp: DateTime<Utc>) -> Self {
        Self {
            detected: false,
            significant_regions: Vec::new(),
            timestamp,
        }
    }
}

pub mod motion_classifier {
    use super::*;

    /// Applies the area threshold to each region. A region is significant iff
    /// `area > min_area`; motion is detected iff any region is significant.
    pub fn classify(regions: &[Region], min_area: u32, timestamp: DateTime<Utc>) -> MotionDecision {
        let significant_regions: Vec<Region> = regions
            .iter()
            .copied()
            .filter(|region| region.area > min_area)
            .collect();

        MotionDecision {
            detected: !significant_regions.is_empty(),
            significant_regions,
            timestamp,
        }
    }
}
