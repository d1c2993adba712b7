//! Token purposes.

use std::fmt;

use serde::{Deserialize, Serialize};
use warden_core::settings::SecuritySettings;
use warden_core::utils::within::Within;

/// What a token may be used for.
///
/// The purpose is part of the signed payload and selects the salt, so a token
/// minted for one purpose never resolves for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// Password reset. Single use.
    Reset,
    /// Email confirmation. Single use.
    Confirm,
    /// Authentication session. Reusable until invalidated.
    Auth,
}

impl TokenPurpose {
    /// Every purpose, in a stable order.
    pub const ALL: [Self; 3] = [Self::Reset, Self::Confirm, Self::Auth];

    /// The wire tag of this purpose.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Confirm => "confirm",
            Self::Auth => "auth",
        }
    }

    /// Whether resolving the token should be followed by advancing its marker.
    pub const fn is_single_use(self) -> bool {
        matches!(self, Self::Reset | Self::Confirm)
    }

    /// The configured salt for this purpose.
    pub fn salt(self, security: &SecuritySettings) -> &str {
        match self {
            Self::Reset => &security.reset_salt,
            Self::Confirm => &security.confirm_salt,
            Self::Auth => &security.auth_salt,
        }
    }

    /// The configured validity window. `None` means the token never expires.
    pub const fn within(self, security: &SecuritySettings) -> Option<&Within> {
        match self {
            Self::Reset => Some(&security.reset_password_within),
            Self::Confirm => Some(&security.confirm_email_within),
            Self::Auth => security.auth_token_within.as_ref(),
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_use() {
        assert!(TokenPurpose::Reset.is_single_use());
        assert!(TokenPurpose::Confirm.is_single_use());
        assert!(!TokenPurpose::Auth.is_single_use());
    }

    #[test]
    fn test_salts_and_windows_follow_settings() {
        let mut security = SecuritySettings::default();
        security.auth_token_within = Some(Within::days(30));

        assert_eq!(TokenPurpose::Reset.salt(&security), "reset-salt");
        assert_eq!(TokenPurpose::Auth.salt(&security), "remember-salt");
        assert_eq!(
            TokenPurpose::Confirm.within(&security).map(Within::as_str),
            Some("5 days")
        );
        assert_eq!(
            TokenPurpose::Auth.within(&security).map(Within::as_str),
            Some("30 days")
        );
    }

    #[test]
    fn test_serde_tags() {
        assert_eq!(serde_json::to_string(&TokenPurpose::Confirm).unwrap(), "\"confirm\"");
        let back: TokenPurpose = serde_json::from_str("\"auth\"").unwrap();
        assert_eq!(back, TokenPurpose::Auth);
        assert_eq!(TokenPurpose::Reset.to_string(), "reset");
    }
}
