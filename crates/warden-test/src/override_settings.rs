//! Settings builder for tests.
//!
//! [`SettingsOverride`] starts from test-friendly defaults (secret key
//! `"secret"`) and changes only what a test names. Every service owns its
//! settings, so there is no global to swap and restore.
//!
//! ## Example
//!
//! ```rust
//! use warden_test::override_settings::SettingsOverride;
//!
//! let settings = SettingsOverride::new()
//!     .set_reset_password_within("1 milliseconds")
//!     .set_invalidate_auth_on_password_change(false)
//!     .build();
//!
//! assert_eq!(settings.security.reset_password_within.as_str(), "1 milliseconds");
//! ```

use warden_core::settings::SigningSchemeSettings;
use warden_core::{Settings, Within};

/// A builder for specifying which settings to override.
#[derive(Debug, Clone)]
pub struct SettingsOverride {
    settings: Settings,
}

impl Default for SettingsOverride {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsOverride {
    /// Creates a builder starting from default settings with the secret key `"secret"`.
    pub fn new() -> Self {
        Self::from_settings(Settings {
            secret_key: "secret".to_string(),
            ..Settings::default()
        })
    }

    /// Creates a builder starting from the given settings.
    pub const fn from_settings(settings: Settings) -> Self {
        Self { settings }
    }

    /// Sets the `secret_key`.
    #[must_use]
    pub fn set_secret_key(mut self, key: &str) -> Self {
        self.settings.secret_key = key.to_string();
        self
    }

    /// Sets the reset window.
    ///
    /// # Panics
    ///
    /// Panics if `within` is not a valid window such as `"5 days"`.
    #[must_use]
    pub fn set_reset_password_within(mut self, within: &str) -> Self {
        self.settings.security.reset_password_within = parse(within);
        self
    }

    /// Sets the confirmation window.
    ///
    /// # Panics
    ///
    /// Panics if `within` is not a valid window.
    #[must_use]
    pub fn set_confirm_email_within(mut self, within: &str) -> Self {
        self.settings.security.confirm_email_within = parse(within);
        self
    }

    /// Sets the auth token window. `None` means auth tokens never expire.
    ///
    /// # Panics
    ///
    /// Panics if `within` is not a valid window.
    #[must_use]
    pub fn set_auth_token_within(mut self, within: Option<&str>) -> Self {
        self.settings.security.auth_token_within = within.map(parse);
        self
    }

    /// Replaces the current signing schemes.
    #[must_use]
    pub fn set_signing_schemes(mut self, schemes: Vec<SigningSchemeSettings>) -> Self {
        self.settings.security.signing_schemes = schemes;
        self
    }

    /// Replaces the deprecated signing schemes.
    #[must_use]
    pub fn set_deprecated_signing_schemes(mut self, schemes: Vec<SigningSchemeSettings>) -> Self {
        self.settings.security.deprecated_signing_schemes = schemes;
        self
    }

    /// Sets whether a password change retires outstanding auth tokens.
    #[must_use]
    pub const fn set_invalidate_auth_on_password_change(mut self, invalidate: bool) -> Self {
        self.settings.security.auth_token_invalidate_on_password_change = invalidate;
        self
    }

    /// Overrides a message by its name, e.g. `"INVALID_RESET_PASSWORD_TOKEN"`.
    #[must_use]
    pub fn set_message(mut self, name: &str, text: &str) -> Self {
        self.settings
            .security
            .messages
            .insert(name.to_string(), text.to_string());
        self
    }

    /// Returns the built settings.
    pub fn build(self) -> Settings {
        self.settings
    }
}

fn parse(within: &str) -> Within {
    within
        .parse()
        .unwrap_or_else(|e| panic!("invalid window {within:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SettingsOverride::new().build();
        assert_eq!(s.secret_key, "secret");
        assert!(s.validate().is_ok());
        assert_eq!(s.security.reset_password_within.as_str(), "5 days");
    }

    #[test]
    fn test_windows() {
        let s = SettingsOverride::new()
            .set_reset_password_within("1 milliseconds")
            .set_confirm_email_within("2 hours")
            .set_auth_token_within(Some("30 minutes"))
            .build();
        assert_eq!(s.security.reset_password_within.as_str(), "1 milliseconds");
        assert_eq!(s.security.confirm_email_within.as_str(), "2 hours");
        assert_eq!(
            s.security.auth_token_within.as_ref().map(Within::as_str),
            Some("30 minutes")
        );
    }

    #[test]
    #[should_panic(expected = "invalid window")]
    fn test_invalid_window_panics() {
        let _ = SettingsOverride::new().set_reset_password_within("soon");
    }

    #[test]
    fn test_schemes_and_messages() {
        let s = SettingsOverride::new()
            .set_signing_schemes(vec![SigningSchemeSettings::new("v2")])
            .set_deprecated_signing_schemes(vec![SigningSchemeSettings::new("v1")])
            .set_message("INVALID_RESET_PASSWORD_TOKEN", "Nope")
            .set_invalidate_auth_on_password_change(false)
            .build();
        assert_eq!(s.security.signing_schemes[0].name, "v2");
        assert_eq!(s.security.deprecated_signing_schemes[0].name, "v1");
        assert_eq!(s.security.messages["INVALID_RESET_PASSWORD_TOKEN"], "Nope");
        assert!(!s.security.auth_token_invalidate_on_password_change);
    }

    #[test]
    fn test_from_settings_keeps_base() {
        let base = Settings {
            secret_key: "base".to_string(),
            ..Settings::default()
        };
        let s = SettingsOverride::from_settings(base).build();
        assert_eq!(s.secret_key, "base");
    }
}
