// THEORY:
// The `notifier` module packages a motion decision and its evidence frame
// into a `NotificationPayload` and hands it to a `DeliveryChannel`. The
// channel is the transport seam: the engine is agnostic to whether delivery
// means SMTP, a webhook, or a push service — only the send Result matters.
//
// Key architectural principles:
// 1.  **Degrade gracefully on encoding failure**: Evidence is attached as a
//     quality-85 JPEG. If compression fails, the textual notification still
//     goes out; the failure is logged, never propagated.
// 2.  **Disabled is not an error**: When notifications are switched off by
//     configuration the notifier reports `Disabled`, a distinct outcome from
//     a transport failure, so the caller can tell policy from breakage.
// 3.  **Transport failures belong to the caller**: A send error is returned
//     as-is. The alert counts as not-sent and the cooldown window stays open.

use crate::core_modules::frame::Frame;
use crate::core_modules::motion_classifier::MotionDecision;
use crate::error::TransportError;
use chrono::{DateTime, Utc};
use image::ImageEncoder;
use tracing::{debug, warn};

const JPEG_QUALITY: u8 = 85;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ATTACHMENT_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Everything a delivery channel needs to transmit one alert.
/// Constructed fresh per dispatched alert and discarded after the send.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    /// When the motion was observed.
    pub timestamp: DateTime<Utc>,
    /// Which capture device observed it.
    pub camera_index: u32,
    /// Human-readable one-line summary.
    pub subject: String,
    /// Human-readable message body.
    pub body: String,
    /// Suggested filename for the attachment.
    pub attachment_name: String,
    /// JPEG-encoded evidence frame, when encoding succeeded.
    pub evidence_jpeg: Option<Vec<u8>>,
}

/// The transport seam. Implementations perform the actual send (email,
/// webhook, push); the engine only cares about the Result.
pub trait DeliveryChannel {
    fn send(&mut self, payload: &NotificationPayload) -> Result<(), TransportError>;
}

/// A delivery channel that records payloads to the log. Stands in for a real
/// transport in the demo binary.
#[derive(Debug, Default)]
pub struct LoggingChannel;

impl DeliveryChannel for LoggingChannel {
    fn send(&mut self, payload: &NotificationPayload) -> Result<(), TransportError> {
        tracing::info!(
            subject = %payload.subject,
            attachment_bytes = payload.evidence_jpeg.as_ref().map_or(0, Vec::len),
            "notification delivered to log"
        );
        Ok(())
    }
}

/// Outcome of a notification attempt that did not fail in transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The channel accepted the payload.
    Delivered,
    /// Notifications are globally disabled by configuration; nothing was sent.
    Disabled,
}

/// Builds notification payloads and pushes them through a delivery channel.
pub struct Notifier<C: DeliveryChannel> {
    channel: C,
    enabled: bool,
    camera_index: u32,
}

impl<C: DeliveryChannel> Notifier<C> {
    pub fn new(channel: C, enabled: bool, camera_index: u32) -> Self {
        Self {
            channel,
            enabled,
            camera_index,
        }
    }

    /// Packages the decision (and evidence frame, when given) and sends it.
    ///
    /// Returns `Disabled` without touching the channel when notifications are
    /// off. A transport failure is returned to the caller; an evidence
    /// encoding failure only drops the attachment.
    pub fn notify(
        &mut self,
        decision: &MotionDecision,
        evidence: Option<&Frame>,
    ) -> Result<NotifyOutcome, TransportError> {
        if !self.enabled {
            debug!("notifications disabled; alert not sent");
            return Ok(NotifyOutcome::Disabled);
        }

        let payload = self.build_payload(decision, evidence);
        self.channel.send(&payload)?;
        Ok(NotifyOutcome::Delivered)
    }

    fn build_payload(
        &self,
        decision: &MotionDecision,
        evidence: Option<&Frame>,
    ) -> NotificationPayload {
        let stamp = decision.timestamp.format(TIMESTAMP_FORMAT);
        let subject = format!("Motion Detected - {stamp}");
        let body = format!(
            "Motion has been detected by your security camera.\n\n\
             Time: {stamp}\n\
             Camera Index: {}\n\
             Regions: {}\n\n\
             Please check your camera feed for details.\n",
            self.camera_index,
            decision.significant_regions.len(),
        );
        let attachment_name = format!(
            "motion_{}.jpg",
            decision.timestamp.format(ATTACHMENT_STAMP_FORMAT)
        );

        let evidence_jpeg = evidence.and_then(|frame| match encode_evidence(frame) {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                warn!(%error, "could not encode evidence image; sending without attachment");
                None
            }
        });

        NotificationPayload {
            timestamp: decision.timestamp,
            camera_index: self.camera_index,
            subject,
            body,
            attachment_name,
            evidence_jpeg,
        }
    }
}

/// Compresses the frame as a quality-85 JPEG. JPEG carries no alpha channel,
/// so the RGBA buffer is flattened to RGB first.
fn encode_evidence(frame: &Frame) -> Result<Vec<u8>, image::ImageError> {
    let rgb: Vec<u8> = frame
        .data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder.write_image(
        &rgb,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}
