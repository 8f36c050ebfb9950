// THEORY:
// The `error` module defines the single failure taxonomy for the entire engine.
// Every fallible seam in the system maps onto exactly one variant here, which
// keeps the fatal/recoverable distinction explicit at the type level:
//
// - `Acquisition`      — the capture device could not be opened or died mid-run.
//                        Fatal: the monitor loop reports it and exits.
// - `DimensionMismatch`— a frame arrived with a shape the background model was
//                        not built for. Fatal: this indicates misconfiguration,
//                        and silently resizing would corrupt the model.
// - `Encoding`         — evidence-image compression failed. Recoverable: the
//                        notifier logs it and sends the alert without the
//                        attachment.
// - `Transport`        — the delivery channel failed to send. Reported to the
//                        caller; the alert counts as not-sent and the cooldown
//                        window is left open.
// - `Config`           — invalid or missing settings. Fatal at startup, before
//                        the detection loop ever runs.

use thiserror::Error;

/// Top-level error type for the detection and alerting engine.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// The capture device could not be opened or stopped producing frames.
    #[error("failed to acquire capture device {device}")]
    Acquisition { device: String },

    /// A frame's shape does not match the shape the background model learned.
    #[error(
        "frame is {got_width}x{got_height} but the background model was built \
         for {want_width}x{want_height}"
    )]
    DimensionMismatch {
        want_width: u32,
        want_height: u32,
        got_width: u32,
        got_height: u32,
    },

    /// Evidence-image compression failed. Handled locally by the notifier.
    #[error("evidence image encoding failed: {0}")]
    Encoding(#[from] image::ImageError),

    /// The delivery channel could not transmit the notification.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration was invalid at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A failure reported by a `DeliveryChannel` while transmitting a payload.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct TransportError(pub String);

/// One or more invalid configuration settings, collected at startup.
///
/// Validation never short-circuits: every problem found is listed so the
/// operator can fix the whole configuration in one pass.
#[derive(Debug, Error)]
#[error("invalid configuration:\n{}", .problems.iter().map(|p| format!("  - {p}")).collect::<Vec<_>>().join("\n"))]
pub struct ConfigError {
    pub problems: Vec<String>,
}
