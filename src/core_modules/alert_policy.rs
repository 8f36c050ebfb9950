// THEORY:
// The `AlertPolicy` is the rate limiter between detection and notification.
// It is a two-state machine:
//
//   IDLE       — no alert has ever been delivered, or the cooldown since the
//                last one has elapsed.
//   SUPPRESSED — an alert was delivered within the last `cooldown` seconds.
//
// A `detected = true` decision in IDLE yields `Emit`; in SUPPRESSED it yields
// `Emit` once the cooldown has elapsed (treated as a fresh IDLE that
// immediately re-suppresses) and `Suppress` otherwise. A `detected = false`
// decision never yields `Emit` and never changes state.
//
// Key architectural principles:
// 1.  **State advances only on delivery**: `evaluate` is read-only; the last
//     alert timestamp moves only when the caller reports a successful
//     dispatch via `record_dispatch`. A failed send therefore does not
//     consume the cooldown window and the next detection may retry at once.
// 2.  **Synchronous, per-frame**: The machine is evaluated once per frame
//     with the frame's own timestamp as the clock. No buffering or batching
//     of motion events ever happens across frames.

use chrono::{DateTime, Duration, Utc};

/// What the policy wants done with a motion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    /// Dispatch a notification now.
    Emit,
    /// Stay quiet: no motion, or still inside the cooldown window.
    Suppress,
}

/// Cooldown gate between motion decisions and notification dispatch.
pub struct AlertPolicy {
    cooldown: Duration,
    /// Timestamp of the last successfully delivered alert. `None` until the
    /// first delivery.
    last_alert: Option<DateTime<Utc>>,
}

impl AlertPolicy {
    pub fn new(cooldown_seconds: i64) -> Self {
        Self {
            cooldown: Duration::seconds(cooldown_seconds),
            last_alert: None,
        }
    }

    /// Decides whether an alert should go out at `now`. Read-only: call
    /// `record_dispatch` after the notification is actually delivered.
    pub fn evaluate(&self, detected: bool, now: DateTime<Utc>) -> AlertAction {
        if !detected {
            return AlertAction::Suppress;
        }
        match self.last_alert {
            None => AlertAction::Emit,
            Some(last) if now - last >= self.cooldown => AlertAction::Emit,
            Some(_) => AlertAction::Suppress,
        }
    }

    /// Records a successful delivery, opening a fresh cooldown window.
    pub fn record_dispatch(&mut self, now: DateTime<Utc>) {
        self.last_alert = Some(now);
    }

    /// Timestamp of the last delivered alert, if any.
    pub fn last_alert(&self) -> Option<DateTime<Utc>> {
        self.last_alert
    }
}
