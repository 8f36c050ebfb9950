// End-to-end scenarios for the full detect-and-alert chain: a synthetic
// 40-frame sequence through pipeline, policy, and notifier, plus the
// transport-failure property (a failed send must not consume the cooldown).

use chrono::{DateTime, Duration, TimeZone, Utc};
use sentinel_vision::core_modules::notifier::NotificationPayload;
use sentinel_vision::{
    AlertAction, AlertPolicy, DeliveryChannel, DetectionPipeline, Frame, Notifier, NotifyOutcome,
    PipelineConfig, TransportError,
};
use std::sync::{Arc, Mutex};

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

#[derive(Clone)]
struct RecordingChannel {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl DeliveryChannel for RecordingChannel {
    fn send(&mut self, payload: &NotificationPayload) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError("smtp refused connection".into()));
        }
        self.sent.lock().unwrap().push(payload.subject.clone());
        Ok(())
    }
}

fn background_frame(timestamp: DateTime<Utc>) -> Frame {
    Frame::new(
        WIDTH,
        HEIGHT,
        [50u8, 50, 50, 255].repeat((WIDTH * HEIGHT) as usize),
        timestamp,
    )
}

/// Background frame with a 50x40 (area 2000) bright rectangle.
fn intruder_frame(timestamp: DateTime<Utc>) -> Frame {
    let mut data = [50u8, 50, 50, 255].repeat((WIDTH * HEIGHT) as usize);
    for y in 30..70u32 {
        for x in 40..90u32 {
            let offset = ((y * WIDTH + x) * 4) as usize;
            data[offset] = 220;
            data[offset + 1] = 220;
            data[offset + 2] = 220;
        }
    }
    Frame::new(WIDTH, HEIGHT, data, timestamp)
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

/// Frames 1-30 warm up, 31-35 are static background, 36-38 carry a 2000-pixel
/// rectangle (default threshold 500, cooldown 60s, frames one second apart):
/// exactly one emit on frame 36, suppress on 37 and 38.
#[test]
fn forty_frame_scenario_yields_one_alert() {
    let mut pipeline = DetectionPipeline::new(PipelineConfig::default());
    let mut policy = AlertPolicy::new(60);
    let sent = Arc::new(Mutex::new(Vec::new()));
    let mut notifier = Notifier::new(
        RecordingChannel {
            sent: sent.clone(),
            fail: false,
        },
        true,
        0,
    );

    let start = start_time();
    let mut emits = Vec::new();
    let mut suppressions = Vec::new();

    for index in 1..=40u32 {
        let timestamp = start + Duration::seconds(index as i64);
        let frame = if (36..=38).contains(&index) {
            intruder_frame(timestamp)
        } else {
            background_frame(timestamp)
        };

        let decision = pipeline.process_frame(&frame).unwrap();

        if index <= 30 {
            assert!(!decision.detected, "warm-up frame {index} reported motion");
            continue;
        }
        if (31..=35).contains(&index) {
            assert!(!decision.detected, "static frame {index} reported motion");
            continue;
        }
        if (36..=38).contains(&index) {
            assert!(decision.detected, "intruder frame {index} missed");
            match policy.evaluate(decision.detected, decision.timestamp) {
                AlertAction::Emit => {
                    let outcome = notifier.notify(&decision, Some(&frame)).unwrap();
                    assert_eq!(outcome, NotifyOutcome::Delivered);
                    policy.record_dispatch(decision.timestamp);
                    emits.push(index);
                }
                AlertAction::Suppress => suppressions.push(index),
            }
        }
    }

    assert_eq!(emits, vec![36]);
    assert_eq!(suppressions, vec![37, 38]);
    assert_eq!(sent.lock().unwrap().len(), 1);
}

/// A transport failure leaves the policy's last-alert timestamp untouched, so
/// the cooldown window is not consumed by the failed attempt.
#[test]
fn transport_failure_does_not_consume_cooldown() {
    let mut pipeline = DetectionPipeline::new(PipelineConfig::default());
    let mut policy = AlertPolicy::new(60);
    let mut notifier = Notifier::new(
        RecordingChannel {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        },
        true,
        0,
    );

    let start = start_time();
    for index in 1..=35u32 {
        let timestamp = start + Duration::seconds(index as i64);
        pipeline.process_frame(&background_frame(timestamp)).unwrap();
    }

    let timestamp = start + Duration::seconds(36);
    let decision = pipeline.process_frame(&intruder_frame(timestamp)).unwrap();
    assert!(decision.detected);

    let last_before = policy.last_alert();
    assert_eq!(
        policy.evaluate(decision.detected, decision.timestamp),
        AlertAction::Emit
    );
    let result = notifier.notify(&decision, Some(&intruder_frame(timestamp)));
    assert!(result.is_err());

    // The send failed, so the dispatch is never recorded.
    assert_eq!(policy.last_alert(), last_before);
    // And the very next detection is free to emit again.
    let retry_at = decision.timestamp + Duration::seconds(1);
    assert_eq!(policy.evaluate(true, retry_at), AlertAction::Emit);
}
