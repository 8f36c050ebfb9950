// THEORY:
// This file is the main entry point for the `sentinel_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API exposed to external consumers (like the bundled monitor binary).
//
// The primary exports are the `DetectionPipeline` (per-frame motion
// detection), the `Monitor` driver loop with its `FrameSource` seam, and the
// alerting pieces (`AlertPolicy`, `Notifier`, `DeliveryChannel`). The
// low-level analysis modules live in `core_modules` and remain reachable for
// callers that want to compose the stages themselves.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod monitor;
pub mod pipeline;

pub use config::MonitorSettings;
pub use core_modules::alert_policy::{AlertAction, AlertPolicy};
pub use core_modules::frame::{Frame, ForegroundMask};
pub use core_modules::notifier::{
    DeliveryChannel, LoggingChannel, NotificationPayload, Notifier, NotifyOutcome,
};
pub use error::{ConfigError, SentinelError, TransportError};
pub use monitor::{FrameSource, Monitor, RunSummary};
pub use pipeline::{BoundingBox, DetectionPipeline, MotionDecision, PipelineConfig, Region};
