//! Settings for warden.
//!
//! [`Settings`] is constructed once at startup (usually through
//! [`settings_loader`](crate::settings_loader)) and passed by reference into
//! the token service. There is no process-wide settings cell; two services in
//! the same process can run with different secrets.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};
use crate::utils::within::Within;

/// The keyed-hash construction used by a signing scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    /// HMAC over SHA-256.
    #[default]
    HmacSha256,
    /// HMAC over SHA-384.
    HmacSha384,
    /// HMAC over SHA-512.
    HmacSha512,
}

/// One generation of signing material.
///
/// Schemes are listed in order in [`SecuritySettings::signing_schemes`] (the
/// first is current) and [`SecuritySettings::deprecated_signing_schemes`]
/// (still accepted for verification, never used to sign).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSchemeSettings {
    /// A label for logs, e.g. `"2024-rotation"`.
    pub name: String,
    /// The secret for this generation. Empty means "use the top-level `secret_key`".
    #[serde(default)]
    pub secret: String,
    /// The MAC algorithm.
    #[serde(default)]
    pub algorithm: SignatureAlgorithm,
    /// Replaces the purpose salt for this generation when set.
    #[serde(default)]
    pub salt: Option<String>,
}

impl SigningSchemeSettings {
    /// Creates a scheme that signs with the top-level secret key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: String::new(),
            algorithm: SignatureAlgorithm::default(),
            salt: None,
        }
    }

    /// Sets an explicit secret for this scheme.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sets the MAC algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Overrides the purpose salt for this scheme.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }
}

/// Token-related security configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    // ── Salts ────────────────────────────────────────────────────────

    /// Salt for password-reset tokens.
    pub reset_salt: String,
    /// Salt for email-confirmation tokens.
    pub confirm_salt: String,
    /// Salt for authentication tokens.
    pub auth_salt: String,

    // ── Validity windows ─────────────────────────────────────────────

    /// How long a password-reset token stays valid.
    pub reset_password_within: Within,
    /// How long an email-confirmation token stays valid.
    pub confirm_email_within: Within,
    /// How long an auth token stays valid. `None` means no expiry.
    pub auth_token_within: Option<Within>,

    // ── Signing schemes ──────────────────────────────────────────────

    /// Accepted schemes, current first.
    pub signing_schemes: Vec<SigningSchemeSettings>,
    /// Schemes still accepted for verification, tried in order after the current ones.
    pub deprecated_signing_schemes: Vec<SigningSchemeSettings>,

    // ── Policy ───────────────────────────────────────────────────────

    /// Whether a password change invalidates every outstanding auth token.
    pub auth_token_invalidate_on_password_change: bool,

    // ── Messages ─────────────────────────────────────────────────────

    /// User-facing message overrides, keyed by message name
    /// (e.g. `"INVALID_RESET_PASSWORD_TOKEN"`).
    pub messages: HashMap<String, String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            reset_salt: "reset-salt".to_string(),
            confirm_salt: "confirm-salt".to_string(),
            auth_salt: "remember-salt".to_string(),
            reset_password_within: Within::days(5),
            confirm_email_within: Within::days(5),
            auth_token_within: None,
            signing_schemes: vec![SigningSchemeSettings::new("default")],
            deprecated_signing_schemes: Vec::new(),
            auth_token_invalidate_on_password_change: true,
            messages: HashMap::new(),
        }
    }
}

/// The complete set of warden settings.
///
/// # Examples
///
/// ```
/// use warden_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.security.reset_password_within.as_str(), "5 days");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs).
    pub debug: bool,
    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
    /// The secret key used by schemes without their own secret.
    pub secret_key: String,
    /// Token configuration.
    pub security: SecuritySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            secret_key: String::new(),
            security: SecuritySettings::default(),
        }
    }
}

impl Settings {
    /// Returns the secret a scheme signs with.
    pub fn scheme_secret<'a>(&'a self, scheme: &'a SigningSchemeSettings) -> &'a str {
        if scheme.secret.is_empty() {
            &self.secret_key
        } else {
            &scheme.secret
        }
    }

    /// Checks the settings for combinations the token service cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::ImproperlyConfigured`] when no signing scheme is
    /// configured, a scheme resolves to an empty secret, scheme names repeat,
    /// or two purposes share a salt.
    pub fn validate(&self) -> WardenResult<()> {
        let security = &self.security;

        if security.signing_schemes.is_empty() {
            return Err(WardenError::ImproperlyConfigured(
                "At least one signing scheme is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for scheme in security
            .signing_schemes
            .iter()
            .chain(&security.deprecated_signing_schemes)
        {
            if self.scheme_secret(scheme).is_empty() {
                return Err(WardenError::ImproperlyConfigured(format!(
                    "Signing scheme '{}' has no secret and secret_key is empty",
                    scheme.name
                )));
            }
            if !names.insert(scheme.name.as_str()) {
                return Err(WardenError::ImproperlyConfigured(format!(
                    "Signing scheme '{}' is listed more than once",
                    scheme.name
                )));
            }
        }

        let salts = [
            &security.reset_salt,
            &security.confirm_salt,
            &security.auth_salt,
        ];
        let distinct: HashSet<&String> = salts.iter().copied().collect();
        if distinct.len() != salts.len() {
            return Err(WardenError::ImproperlyConfigured(
                "reset_salt, confirm_salt and auth_salt must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        Settings {
            secret_key: "secret".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert!(s.secret_key.is_empty());
        assert_eq!(s.log_level, "info");
        assert_eq!(s.security.reset_salt, "reset-salt");
        assert_eq!(s.security.confirm_salt, "confirm-salt");
        assert_eq!(s.security.auth_salt, "remember-salt");
        assert_eq!(s.security.confirm_email_within.as_str(), "5 days");
        assert!(s.security.auth_token_within.is_none());
        assert!(s.security.auth_token_invalidate_on_password_change);
        assert_eq!(s.security.signing_schemes.len(), 1);
        assert!(s.security.deprecated_signing_schemes.is_empty());
    }

    #[test]
    fn test_validate_ok() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_secret() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("no secret"));
    }

    #[test]
    fn test_validate_scheme_with_own_secret() {
        let mut s = Settings::default();
        s.security.signing_schemes = vec![SigningSchemeSettings::new("own").with_secret("k")];
        assert!(s.validate().is_ok());
        assert_eq!(s.scheme_secret(&s.security.signing_schemes[0]), "k");
    }

    #[test]
    fn test_validate_requires_scheme() {
        let mut s = configured();
        s.security.signing_schemes.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_scheme_names() {
        let mut s = configured();
        s.security.deprecated_signing_schemes = vec![SigningSchemeSettings::new("default")];
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_shared_salt() {
        let mut s = configured();
        s.security.confirm_salt = s.security.reset_salt.clone();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_algorithm_serde_names() {
        let json = serde_json::to_string(&SignatureAlgorithm::HmacSha512).unwrap();
        assert_eq!(json, "\"hmac-sha512\"");
    }
}
