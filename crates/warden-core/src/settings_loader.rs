//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `WARDEN_SECRET_KEY` | `secret_key` |
//! | `WARDEN_DEBUG` | `debug` |
//! | `WARDEN_LOG_LEVEL` | `log_level` |
//! | `WARDEN_RESET_PASSWORD_WITHIN` | `security.reset_password_within` |
//! | `WARDEN_CONFIRM_EMAIL_WITHIN` | `security.confirm_email_within` |
//! | `WARDEN_AUTH_TOKEN_WITHIN` | `security.auth_token_within` (`none` clears it) |
//! | `WARDEN_AUTH_TOKEN_INVALIDATE_ON_PASSWORD_CHANGE` | `security.auth_token_invalidate_on_password_change` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use warden_core::settings_loader;
//!
//! // Load from TOML
//! let settings = settings_loader::from_toml_file("config/warden.toml").unwrap();
//!
//! // Load from TOML with environment overrides
//! let settings = settings_loader::from_toml_file_with_env("config/warden.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::{WardenError, WardenResult};
use crate::settings::Settings;
use crate::utils::within::Within;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values, including
/// nested fields of the `[security]` table.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> WardenResult<Settings> {
    // Deserialize into a generic value first and merge it over the defaults,
    // so a partial file only overrides what it names.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| WardenError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> WardenResult<Settings> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        WardenError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or an
/// environment override holds an invalid value.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> WardenResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> WardenResult<Settings> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| WardenError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> WardenResult<Settings> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        WardenError::ConfigurationError(format!(
            "Failed to read JSON file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_json_str(&content)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the JSON is malformed, or an
/// environment override holds an invalid value.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> WardenResult<Settings> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
///
/// # Errors
///
/// Returns an error if an environment override holds an invalid value.
pub fn from_env() -> WardenResult<Settings> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes" (anything else is false).
/// Window variables use the same `"<amount> <unit>"` form as the files.
///
/// # Errors
///
/// Returns [`WardenError::ConfigurationError`] if a window variable cannot be parsed.
pub fn apply_env_overrides(settings: &mut Settings) -> WardenResult<()> {
    if let Ok(val) = std::env::var("WARDEN_SECRET_KEY") {
        settings.secret_key = val;
    }

    if let Ok(val) = std::env::var("WARDEN_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("WARDEN_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("WARDEN_RESET_PASSWORD_WITHIN") {
        settings.security.reset_password_within = Within::parse(&val)?;
    }

    if let Ok(val) = std::env::var("WARDEN_CONFIRM_EMAIL_WITHIN") {
        settings.security.confirm_email_within = Within::parse(&val)?;
    }

    if let Ok(val) = std::env::var("WARDEN_AUTH_TOKEN_WITHIN") {
        settings.security.auth_token_within = if val.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(Within::parse(&val)?)
        };
    }

    if let Ok(val) = std::env::var("WARDEN_AUTH_TOKEN_INVALIDATE_ON_PASSWORD_CHANGE") {
        settings.security.auth_token_invalidate_on_password_change = parse_bool(&val);
    }

    Ok(())
}

// ============================================================
// Helpers
// ============================================================

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Merges a parsed document over the default settings and deserializes the result.
fn merge_over_defaults(value: serde_json::Value, format: &str) -> WardenResult<Settings> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        WardenError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        WardenError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
