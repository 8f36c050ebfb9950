// THEORY:
// The `monitor` module is the driver of the whole engine: a single-threaded,
// synchronous pull loop. Each iteration pulls one frame from the
// `FrameSource`, runs it through the detection pipeline, and — when the
// pipeline reports motion — consults the alert policy and possibly dispatches
// a notification. No frame is processed concurrently with another; the
// background model's sequential-update invariant depends on this.
//
// Key architectural principles:
// 1.  **Pull, don't push**: The loop owns the cadence. The only blocking
//     operations are frame acquisition and notification delivery, both on
//     this thread; a slow delivery stalls capture, an accepted trade-off for
//     a single-owner state model with no locking.
// 2.  **Cooperative cancellation**: The loop checks an external stop flag
//     between frames and unwinds cleanly when it is raised.
// 3.  **Guaranteed release**: The frame source is closed on every exit path —
//     end of stream, stop signal, or a fatal pipeline error.
// 4.  **Failed sends don't consume the cooldown**: The policy's state only
//     advances after the channel confirms delivery.

use crate::config::MonitorSettings;
use crate::core_modules::alert_policy::{AlertAction, AlertPolicy};
use crate::core_modules::frame::Frame;
use crate::core_modules::notifier::{DeliveryChannel, Notifier, NotifyOutcome};
use crate::error::SentinelError;
use crate::pipeline::{DetectionPipeline, MotionDecision, PipelineConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// The frame acquisition seam. A camera-backed implementation is the normal
/// collaborator; tests and the demo binary supply synthetic ones.
pub trait FrameSource {
    /// Opens the underlying device. Failure is fatal to the run.
    fn open(&mut self) -> Result<(), SentinelError>;
    /// Pulls the next frame. `None` means end of stream (a failed read is
    /// treated the same way) and terminates the loop.
    fn read_frame(&mut self) -> Option<Frame>;
    /// Releases the underlying device. Called on every exit path.
    fn close(&mut self);
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub alerts_delivered: u64,
    pub alerts_suppressed: u64,
}

/// The top-level surveillance loop: detection pipeline, alert policy, and
/// notifier wired together over a frame source.
pub struct Monitor<C: DeliveryChannel> {
    pipeline: DetectionPipeline,
    policy: AlertPolicy,
    notifier: Notifier<C>,
    stop: Arc<AtomicBool>,
}

impl<C: DeliveryChannel> Monitor<C> {
    pub fn new(settings: &MonitorSettings, channel: C, stop: Arc<AtomicBool>) -> Self {
        let pipeline_config = PipelineConfig {
            min_region_area: settings.min_contour_area,
            ..PipelineConfig::default()
        };
        Self {
            pipeline: DetectionPipeline::new(pipeline_config),
            policy: AlertPolicy::new(settings.notification_cooldown_seconds),
            notifier: Notifier::new(
                channel,
                settings.notifications_enabled,
                settings.camera_index,
            ),
            stop,
        }
    }

    /// Runs the pull loop until end of stream, stop signal, or fatal error.
    /// The source is released on every exit path.
    pub fn run<S: FrameSource>(&mut self, source: &mut S) -> Result<RunSummary, SentinelError> {
        source.open()?;
        let result = self.run_loop(source);
        source.close();
        result
    }

    fn run_loop<S: FrameSource>(&mut self, source: &mut S) -> Result<RunSummary, SentinelError> {
        let mut summary = RunSummary::default();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                info!("stop signal observed, ending run");
                break;
            }

            let Some(frame) = source.read_frame() else {
                info!("end of stream");
                break;
            };

            let decision = self.pipeline.process_frame(&frame)?;
            summary.frames_processed += 1;

            if decision.detected {
                self.handle_motion(&decision, &frame, &mut summary);
            }
        }

        info!(
            frames = summary.frames_processed,
            delivered = summary.alerts_delivered,
            suppressed = summary.alerts_suppressed,
            "run finished"
        );
        Ok(summary)
    }

    fn handle_motion(&mut self, decision: &MotionDecision, frame: &Frame, summary: &mut RunSummary) {
        match self.policy.evaluate(decision.detected, decision.timestamp) {
            AlertAction::Suppress => {
                summary.alerts_suppressed += 1;
                debug!(at = %decision.timestamp, "motion detected inside cooldown, suppressed");
            }
            AlertAction::Emit => match self.notifier.notify(decision, Some(frame)) {
                Ok(NotifyOutcome::Delivered) => {
                    self.policy.record_dispatch(decision.timestamp);
                    summary.alerts_delivered += 1;
                    info!(
                        at = %decision.timestamp,
                        regions = decision.significant_regions.len(),
                        "motion alert delivered"
                    );
                }
                Ok(NotifyOutcome::Disabled) => {
                    debug!("motion detected but notifications are disabled");
                }
                Err(error) => {
                    // Not-sent: the cooldown window stays open for a retry on
                    // the next detection.
                    warn!(%error, "alert delivery failed");
                }
            },
        }
    }
}
