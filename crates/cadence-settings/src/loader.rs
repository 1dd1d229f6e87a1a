//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`CadenceSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{
    CadenceSettings, MAX_IDLE_TIMEOUT_SECS, MAX_SWEEP_INTERVAL_SECS, PlannerMode,
};

/// Resolve the path to the settings file (`~/.cadence/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".cadence").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<CadenceSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or an invalid value is an
/// error.
pub fn load_settings_from_path(path: &Path) -> Result<CadenceSettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Load settings reading overrides through `env` instead of the process
/// environment.
pub fn load_with_env<F>(path: &Path, env: F) -> Result<CadenceSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(CadenceSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: CadenceSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides read through `env`.
///
/// Invalid values are ignored with a warning (file/default value wins).
pub fn apply_overrides<F>(settings: &mut CadenceSettings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| env(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read("CADENCE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("CADENCE_PORT") {
        match parse_u16_range(&v, 0, 65535) {
            Some(port) => settings.server.port = port,
            None => warn_invalid("CADENCE_PORT", &v),
        }
    }

    // ── Session ─────────────────────────────────────────────────────
    if let Some(v) = read("CADENCE_SESSION_TIMEOUT") {
        match parse_u64_range(&v, 1, MAX_IDLE_TIMEOUT_SECS) {
            Some(secs) => settings.session.idle_timeout_secs = secs,
            None => warn_invalid("CADENCE_SESSION_TIMEOUT", &v),
        }
    }
    if let Some(v) = read("CADENCE_SWEEP_INTERVAL") {
        match parse_u64_range(&v, 1, MAX_SWEEP_INTERVAL_SECS) {
            Some(secs) => settings.session.sweep_interval_secs = secs,
            None => warn_invalid("CADENCE_SWEEP_INTERVAL", &v),
        }
    }

    // ── Planner ─────────────────────────────────────────────────────
    if let Some(v) = read("CADENCE_PLANNER") {
        match PlannerMode::parse(&v) {
            Some(mode) => settings.planner.mode = mode,
            None => warn_invalid("CADENCE_PLANNER", &v),
        }
    }
    if let Some(v) = read("CADENCE_MODEL") {
        settings.planner.model = v;
    }
    if settings.planner.api_key.is_none() {
        settings.planner.api_key = read("GOOGLE_API_KEY");
    }

    // ── Widgets / logging ───────────────────────────────────────────
    if let Some(v) = read("CADENCE_TEMPLATES_DIR") {
        settings.widgets.templates_dir = Some(v);
    }
    if let Some(v) = read("CADENCE_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env var, ignoring");
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;
    use assert_matches::assert_matches;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8000, "host": "localhost"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "localhost");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4, 5]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4, 5]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_new_keys_added() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_with_env ───────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_with_env(Path::new("/nonexistent/settings.json"), no_env).unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.session.idle_timeout_secs, 1800);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"session": {"idleTimeoutSecs": 60}, "planner": {"mode": "lookup"}}"#,
        )
        .unwrap();

        let settings = load_with_env(&path, no_env).unwrap();
        assert_eq!(settings.session.idle_timeout_secs, 60);
        assert_eq!(settings.session.sweep_interval_secs, 300);
        assert_eq!(settings.planner.mode, PlannerMode::Lookup);
        assert_eq!(settings.planner.model, "gemini-2.0-flash");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();
        assert_matches!(load_with_env(&path, no_env), Err(SettingsError::Json(_)));
    }

    #[test]
    fn load_invalid_value_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"session": {"sweepIntervalSecs": 0}}"#).unwrap();
        assert_matches!(load_with_env(&path, no_env), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn file_with_huge_sweep_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"session": {"sweepIntervalSecs": 18446744073709551615}}"#,
        )
        .unwrap();
        assert_matches!(load_with_env(&path, no_env), Err(SettingsError::InvalidValue(_)));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": 9000}}"#).unwrap();

        let env = env_of(&[
            ("CADENCE_PORT", "9100"),
            ("CADENCE_HOST", "0.0.0.0"),
            ("CADENCE_SESSION_TIMEOUT", "120"),
            ("CADENCE_SWEEP_INTERVAL", "30"),
            ("CADENCE_PLANNER", "lookup"),
            ("CADENCE_TEMPLATES_DIR", "/srv/templates"),
        ]);
        let settings = load_with_env(&path, env).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.session.idle_timeout_secs, 120);
        assert_eq!(settings.session.sweep_interval_secs, 30);
        assert_eq!(settings.planner.mode, PlannerMode::Lookup);
        assert_eq!(settings.widgets.templates_dir.as_deref(), Some("/srv/templates"));
    }

    #[test]
    fn invalid_env_values_ignored() {
        let mut settings = CadenceSettings::default();
        apply_overrides(
            &mut settings,
            env_of(&[
                ("CADENCE_PORT", "not-a-port"),
                ("CADENCE_SESSION_TIMEOUT", "0"),
                ("CADENCE_PLANNER", "psychic"),
            ]),
        );
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.session.idle_timeout_secs, 1800);
        assert_eq!(settings.planner.mode, PlannerMode::Model);
    }

    #[test]
    fn google_api_key_fills_missing_key_only() {
        let mut settings = CadenceSettings::default();
        apply_overrides(&mut settings, env_of(&[("GOOGLE_API_KEY", "from-env")]));
        assert_eq!(settings.planner.api_key.as_deref(), Some("from-env"));

        let mut settings = CadenceSettings::default();
        settings.planner.api_key = Some("from-file".into());
        apply_overrides(&mut settings, env_of(&[("GOOGLE_API_KEY", "from-env")]));
        assert_eq!(settings.planner.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn empty_env_values_ignored() {
        let mut settings = CadenceSettings::default();
        apply_overrides(&mut settings, env_of(&[("CADENCE_HOST", "")]));
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    // ── range parsing ───────────────────────────────────────────────

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("9090", 1, 65535), Some(9090));
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
        assert_eq!(parse_u64_range("500", 1000, 600_000), None);
        assert_eq!(parse_u64_range("abc", 0, 10), None);
        assert_eq!(parse_u64_range(" 7 ", 0, 10), Some(7));
    }
}
