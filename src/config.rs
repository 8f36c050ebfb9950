// THEORY:
// The `config` module is the entire configuration surface of the engine. It
// reads a flat set of environment variables once at startup and freezes them
// into an immutable `MonitorSettings` value that is passed into each
// component's constructor. No component reads the environment on its own and
// there is no ambient global settings object; what a component was given at
// construction time is what it runs with.
//
// Validation is collect-all, not fail-fast: an operator who left three
// credential fields empty is told about all three, not just the first.

use crate::error::ConfigError;
use std::env;

const DEFAULT_CAMERA_INDEX: u32 = 0;
const DEFAULT_MIN_CONTOUR_AREA: u32 = 500;
const DEFAULT_COOLDOWN_SECONDS: i64 = 60;
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Immutable runtime settings for the monitor, loaded once at startup.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Which capture device to open.
    pub camera_index: u32,
    /// Minimum region area (in pixels, strict) for a region to count as motion.
    pub min_contour_area: u32,
    /// Minimum seconds between two consecutive alert dispatches.
    pub notification_cooldown_seconds: i64,
    /// Master switch for the whole notification path.
    pub notifications_enabled: bool,
    /// Whether the email delivery channel is wired up.
    pub email_enabled: bool,
    /// SMTP host, consumed only by the delivery channel.
    pub smtp_server: String,
    /// SMTP port, consumed only by the delivery channel.
    pub smtp_port: u16,
    /// Sender address. Required when notifications and email are both enabled.
    pub email_from: String,
    /// Recipient address. Required when notifications and email are both enabled.
    pub email_to: String,
    /// Transport secret. Required when notifications and email are both enabled.
    pub email_password: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            camera_index: DEFAULT_CAMERA_INDEX,
            min_contour_area: DEFAULT_MIN_CONTOUR_AREA,
            notification_cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            notifications_enabled: true,
            email_enabled: true,
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            email_from: String::new(),
            email_to: String::new(),
            email_password: String::new(),
        }
    }
}

impl MonitorSettings {
    /// Loads settings from the process environment, falling back to defaults
    /// for anything unset. Unparseable numeric values are collected into a
    /// `ConfigError` rather than silently replaced.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut problems = Vec::new();
        let defaults = Self::default();

        let settings = Self {
            camera_index: parse_var("CAMERA_INDEX", defaults.camera_index, &mut problems),
            min_contour_area: parse_var(
                "MIN_CONTOUR_AREA",
                defaults.min_contour_area,
                &mut problems,
            ),
            notification_cooldown_seconds: parse_var(
                "NOTIFICATION_COOLDOWN_SECONDS",
                defaults.notification_cooldown_seconds,
                &mut problems,
            ),
            notifications_enabled: parse_flag(
                "NOTIFICATION_ENABLED",
                defaults.notifications_enabled,
            ),
            email_enabled: parse_flag("EMAIL_ENABLED", defaults.email_enabled),
            smtp_server: env::var("SMTP_SERVER").unwrap_or(defaults.smtp_server),
            smtp_port: parse_var("SMTP_PORT", defaults.smtp_port, &mut problems),
            email_from: env::var("EMAIL_FROM").unwrap_or_default(),
            email_to: env::var("EMAIL_TO").unwrap_or_default(),
            email_password: env::var("EMAIL_PASSWORD").unwrap_or_default(),
        };

        if problems.is_empty() {
            Ok(settings)
        } else {
            Err(ConfigError { problems })
        }
    }

    /// Checks cross-field requirements, returning every violation at once.
    ///
    /// Transport credentials are only required when the notification path can
    /// actually reach the email channel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.notifications_enabled && self.email_enabled {
            if self.email_from.is_empty() {
                problems.push("EMAIL_FROM is required when email notifications are enabled".into());
            }
            if self.email_to.is_empty() {
                problems.push("EMAIL_TO is required when email notifications are enabled".into());
            }
            if self.email_password.is_empty() {
                problems
                    .push("EMAIL_PASSWORD is required when email notifications are enabled".into());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { problems })
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T, problems: &mut Vec<String>) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                problems.push(format!("{name} has unparseable value {raw:?}"));
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => raw.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}
