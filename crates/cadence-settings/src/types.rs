//! Settings types. Every section defaults, so a partial JSON file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CadenceSettings {
    /// Network listener settings.
    pub server: ServerSettings,
    /// Session lifetime settings.
    pub session: SessionSettings,
    /// Widget planner settings.
    pub planner: PlannerSettings,
    /// Widget template settings.
    pub widgets: WidgetSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Upper bound for `session.idleTimeoutSecs` (one week).
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 7 * 24 * 3600;
/// Upper bound for `session.sweepIntervalSecs` (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 3600;
/// Upper bound for `server.heartbeatIntervalSecs` (one hour).
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 3600;

fn check_range(name: &str, value: u64, max: u64) -> Result<()> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue(format!(
            "{name} must be between 1 and {max}, got {value}"
        )))
    }
}

impl CadenceSettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "session.idleTimeoutSecs",
            self.session.idle_timeout_secs,
            MAX_IDLE_TIMEOUT_SECS,
        )?;
        check_range(
            "session.sweepIntervalSecs",
            self.session.sweep_interval_secs,
            MAX_SWEEP_INTERVAL_SECS,
        )?;
        if self.widgets.date_count == 0 {
            return Err(SettingsError::InvalidValue(
                "widgets.dateCount must be greater than 0".into(),
            ));
        }
        check_range(
            "server.heartbeatIntervalSecs",
            self.server.heartbeat_interval_secs,
            MAX_HEARTBEAT_INTERVAL_SECS,
        )
    }
}

/// Network listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` auto-assigns).
    pub port: u16,
    /// Interval between server pings, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Drop a client after this long without a pong, in seconds.
    pub heartbeat_timeout_secs: u64,
    /// Maximum inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 1024 * 1024,
        }
    }
}

/// Session lifetime settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Idle time after which a session is expired, in seconds.
    pub idle_timeout_secs: u64,
    /// Interval between expiry sweeps, in seconds.
    pub sweep_interval_secs: u64,
}

impl SessionSettings {
    /// Idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            sweep_interval_secs: 300,
        }
    }
}

/// Which widget planning strategy to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerMode {
    /// Ask the language model which widget to fetch (falls back to lookup).
    #[default]
    Model,
    /// Use the fixed action → widget table only.
    Lookup,
}

impl PlannerMode {
    /// Parse a mode name (case-insensitive).
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "model" | "ai" => Some(Self::Model),
            "lookup" | "fallback" => Some(Self::Lookup),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Lookup => "lookup",
        }
    }
}

/// Widget planner settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerSettings {
    /// Planning strategy.
    pub mode: PlannerMode,
    /// Gemini model ID.
    pub model: String,
    /// Gemini API base URL.
    pub base_url: String,
    /// API key. Filled from `GOOGLE_API_KEY` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            mode: PlannerMode::Model,
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            timeout_ms: 10_000,
        }
    }
}

/// Widget template settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetSettings {
    /// Directory of `<widget_type>.json` templates. Built-ins when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<String>,
    /// Number of business days offered by the date selector.
    pub date_count: usize,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            templates_dir: None,
            date_count: 5,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = CadenceSettings::default();
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.session.idle_timeout_secs, 1800);
        assert_eq!(s.session.sweep_interval_secs, 300);
        assert_eq!(s.planner.mode, PlannerMode::Model);
        assert_eq!(s.widgets.date_count, 5);
        assert!(s.widgets.templates_dir.is_none());
        assert_eq!(s.logging.level, "info");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn durations() {
        let s = SessionSettings::default();
        assert_eq!(s.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(s.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn camel_case_serialization() {
        let json = serde_json::to_value(CadenceSettings::default()).unwrap();
        assert_eq!(json["session"]["idleTimeoutSecs"], 1800);
        assert_eq!(json["planner"]["mode"], "model");
        assert!(json["planner"].get("apiKey").is_none());
    }

    #[test]
    fn planner_mode_parse() {
        assert_eq!(PlannerMode::parse("Model"), Some(PlannerMode::Model));
        assert_eq!(PlannerMode::parse("lookup"), Some(PlannerMode::Lookup));
        assert_eq!(PlannerMode::parse("fallback"), Some(PlannerMode::Lookup));
        assert_eq!(PlannerMode::parse("random"), None);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut s = CadenceSettings::default();
        s.session.idle_timeout_secs = 0;
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn validate_rejects_oversized_intervals() {
        let mut s = CadenceSettings::default();
        s.session.sweep_interval_secs = u64::MAX;
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(m)) if m.contains("sweepIntervalSecs")));

        let mut s = CadenceSettings::default();
        s.session.idle_timeout_secs = MAX_IDLE_TIMEOUT_SECS + 1;
        assert!(s.validate().is_err());

        let mut s = CadenceSettings::default();
        s.server.heartbeat_interval_secs = u64::MAX;
        assert!(s.validate().is_err());

        let mut s = CadenceSettings::default();
        s.session.sweep_interval_secs = MAX_SWEEP_INTERVAL_SECS;
        s.session.idle_timeout_secs = MAX_IDLE_TIMEOUT_SECS;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_sweep_interval() {
        let mut s = CadenceSettings::default();
        s.session.sweep_interval_secs = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_date_count() {
        let mut s = CadenceSettings::default();
        s.widgets.date_count = 0;
        assert!(s.validate().is_err());
    }
}
