//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`PodhunterSettings::default()`]
//! 2. If `~/.podhunter/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{BackendPreference, PodhunterSettings};

/// Root directory for podhunter state (`~/.podhunter`).
pub fn podhunter_home() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".podhunter")
}

/// Resolve the path to the settings file (`~/.podhunter/settings.json`).
pub fn settings_path() -> PathBuf {
    podhunter_home().join("settings.json")
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// joined onto [`podhunter_home`].
pub fn resolve_path(configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        podhunter_home().join(path)
    }
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<PodhunterSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<PodhunterSettings> {
    let defaults = serde_json::to_value(PodhunterSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: PodhunterSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
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

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut PodhunterSettings) {
    apply_overrides_with(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning and the file/default value is kept.
pub fn apply_overrides_with(
    settings: &mut PodhunterSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    // ── Gemini ──────────────────────────────────────────────────────
    if let Some(v) = read("PODHUNTER_GEMINI_API_KEY").or_else(|| read("GEMINI_API_KEY")) {
        settings.gemini.api_key = Some(v);
    }
    if let Some(v) = read("PODHUNTER_GEMINI_BASE_URL") {
        settings.gemini.base_url = v;
    }
    if let Some(v) = read("PODHUNTER_GEMINI_MODELS") {
        let models = parse_list(&v);
        if models.is_empty() {
            warn!(key = "PODHUNTER_GEMINI_MODELS", value = %v, "empty model list, ignoring");
        } else {
            settings.gemini.models = models;
        }
    }

    // ── Fetch / retry ───────────────────────────────────────────────
    if let Some(v) = read("PODHUNTER_FETCH_TIMEOUT_MS") {
        match parse_u64_range(&v, 100, 600_000) {
            Some(n) => settings.fetch.timeout_ms = n,
            None => warn!(key = "PODHUNTER_FETCH_TIMEOUT_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = read("PODHUNTER_RETRY_COOLDOWN_MS") {
        match parse_u64_range(&v, 0, 600_000) {
            Some(n) => settings.retry.cooldown_ms = n,
            None => warn!(key = "PODHUNTER_RETRY_COOLDOWN_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }

    // ── Transcription ───────────────────────────────────────────────
    if let Some(v) = read("PODHUNTER_TRANSCRIBE_BACKEND") {
        match v.parse::<BackendPreference>() {
            Ok(backend) => settings.transcription.backend = backend,
            Err(e) => warn!(key = "PODHUNTER_TRANSCRIBE_BACKEND", error = %e, "ignoring"),
        }
    }
    if let Some(v) = read("PODHUNTER_MODEL_SIZE") {
        settings.transcription.model_size = v;
    }
    if let Some(v) = read("PODHUNTER_PYTHON") {
        settings.transcription.interpreter = v;
    }
    if let Some(v) = read("PODHUNTER_TRANSCRIBE_SCRIPT") {
        settings.transcription.script_path = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("PODHUNTER_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("PODHUNTER_LOG_JSON") {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => warn!(key = "PODHUNTER_LOG_JSON", value = %v, "invalid boolean env var, ignoring"),
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> PodhunterSettings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut settings = PodhunterSettings::default();
        apply_overrides_with(&mut settings, |k| env.get(k).cloned());
        settings
    }

    #[test]
    fn deep_merge_nested_objects() {
        let target = serde_json::json!({"a": {"x": 1, "y": 2}, "b": 3});
        let source = serde_json::json!({"a": {"y": 20, "z": 30}});
        let merged = deep_merge(target, source);
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 20, "z": 30}, "b": 3}));
    }

    #[test]
    fn deep_merge_replaces_arrays_and_skips_null() {
        let target = serde_json::json!({"list": [1, 2], "keep": "x"});
        let source = serde_json::json!({"list": [3], "keep": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["list"], serde_json::json!([3]));
        assert_eq!(merged["keep"], "x");
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.extraction.max_source_chars, 500_000);
    }

    #[test]
    fn load_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"gemini": {"models": ["only-model"]}, "retry": {"cooldownMs": 10}}"#,
        )
        .unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.gemini.models, ["only-model"]);
        assert_eq!(settings.retry.cooldown_ms, 10);
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.fetch.proxies.len(), 4);
    }

    #[test]
    fn load_invalid_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    #[test]
    fn load_rejects_empty_proxy_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"fetch": {"proxies": []}}"#).unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    #[test]
    fn gemini_key_prefers_namespaced_var() {
        let settings = overrides(&[
            ("GEMINI_API_KEY", "generic"),
            ("PODHUNTER_GEMINI_API_KEY", "specific"),
        ]);
        assert_eq!(settings.gemini.api_key.as_deref(), Some("specific"));

        let settings = overrides(&[("GEMINI_API_KEY", "generic")]);
        assert_eq!(settings.gemini.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn model_list_override() {
        let settings = overrides(&[("PODHUNTER_GEMINI_MODELS", "a, b,,c")]);
        assert_eq!(settings.gemini.models, ["a", "b", "c"]);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let settings = overrides(&[
            ("PODHUNTER_FETCH_TIMEOUT_MS", "soon"),
            ("PODHUNTER_TRANSCRIBE_BACKEND", "gpu"),
            ("PODHUNTER_LOG_JSON", "maybe"),
            ("PODHUNTER_GEMINI_MODELS", " , "),
        ]);
        let defaults = PodhunterSettings::default();
        assert_eq!(settings.fetch.timeout_ms, defaults.fetch.timeout_ms);
        assert_eq!(settings.transcription.backend, BackendPreference::Auto);
        assert!(!settings.logging.json);
        assert_eq!(settings.gemini.models, defaults.gemini.models);
    }

    #[test]
    fn transcription_overrides() {
        let settings = overrides(&[
            ("PODHUNTER_TRANSCRIBE_BACKEND", "local"),
            ("PODHUNTER_MODEL_SIZE", "small"),
            ("PODHUNTER_PYTHON", "/opt/py/bin/python"),
            ("PODHUNTER_RETRY_COOLDOWN_MS", "0"),
        ]);
        assert_eq!(settings.transcription.backend, BackendPreference::Local);
        assert_eq!(settings.transcription.model_size, "small");
        assert_eq!(settings.transcription.interpreter, "/opt/py/bin/python");
        assert_eq!(settings.retry.cooldown_ms, 0);
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_u64_range("50", 100, 200), None);
        assert_eq!(parse_u64_range("150", 100, 200), Some(150));
    }

    #[test]
    fn resolve_path_keeps_absolute() {
        let abs = if cfg!(windows) { "C:\\tools\\x.py" } else { "/opt/x.py" };
        assert_eq!(resolve_path(abs), PathBuf::from(abs));
        assert!(resolve_path("runtime/x.py").ends_with("runtime/x.py"));
    }
}
