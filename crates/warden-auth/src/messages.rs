//! User-facing messages.
//!
//! Every message has a default text and a stable name
//! (e.g. `PASSWORD_RESET_EXPIRED`). Deployments override texts through
//! [`SecuritySettings::messages`](warden_core::settings::SecuritySettings::messages),
//! keyed by that name. Texts may contain `{within}` and `{email}` placeholders.

use std::collections::HashMap;

use warden_core::error::{WardenError, WardenResult};
use warden_core::settings::SecuritySettings;

/// Identifies a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// A reset token failed for a reason that is not disclosed.
    InvalidResetPasswordToken,
    /// A reset token expired; new instructions were sent.
    PasswordResetExpired,
    /// The password was reset.
    PasswordReset,
    /// A signed-in user changed their password.
    PasswordChange,
    /// A confirmation token failed for a reason that is not disclosed.
    InvalidConfirmationToken,
    /// A confirmation token expired; new instructions were sent.
    ConfirmationExpired,
    /// The email was confirmed.
    EmailConfirmed,
    /// The email had already been confirmed.
    AlreadyConfirmed,
    /// An account already uses this email.
    EmailAlreadyAssociated,
    /// An auth token failed for a reason that is not disclosed.
    InvalidAuthToken,
    /// An auth token expired.
    AuthTokenExpired,
    /// Reset instructions were sent.
    PasswordResetRequest,
    /// Confirmation instructions were sent.
    ConfirmationRequest,
    /// No account uses the given email.
    UserDoesNotExist,
}

impl MessageKey {
    /// Every key.
    pub const ALL: [Self; 14] = [
        Self::InvalidResetPasswordToken,
        Self::PasswordResetExpired,
        Self::PasswordReset,
        Self::PasswordChange,
        Self::InvalidConfirmationToken,
        Self::ConfirmationExpired,
        Self::EmailConfirmed,
        Self::AlreadyConfirmed,
        Self::EmailAlreadyAssociated,
        Self::InvalidAuthToken,
        Self::AuthTokenExpired,
        Self::PasswordResetRequest,
        Self::ConfirmationRequest,
        Self::UserDoesNotExist,
    ];

    /// The name used for overrides in settings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidResetPasswordToken => "INVALID_RESET_PASSWORD_TOKEN",
            Self::PasswordResetExpired => "PASSWORD_RESET_EXPIRED",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::PasswordChange => "PASSWORD_CHANGE",
            Self::InvalidConfirmationToken => "INVALID_CONFIRMATION_TOKEN",
            Self::ConfirmationExpired => "CONFIRMATION_EXPIRED",
            Self::EmailConfirmed => "EMAIL_CONFIRMED",
            Self::AlreadyConfirmed => "ALREADY_CONFIRMED",
            Self::EmailAlreadyAssociated => "EMAIL_ALREADY_ASSOCIATED",
            Self::InvalidAuthToken => "INVALID_AUTH_TOKEN",
            Self::AuthTokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::PasswordResetRequest => "PASSWORD_RESET_REQUEST",
            Self::ConfirmationRequest => "CONFIRMATION_REQUEST",
            Self::UserDoesNotExist => "USER_DOES_NOT_EXIST",
        }
    }

    /// Looks a key up by its settings name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// The built-in text.
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::InvalidResetPasswordToken => "Invalid reset password token.",
            Self::PasswordResetExpired => {
                "You did not reset your password within {within}. \
                 New instructions have been sent to {email}."
            }
            Self::PasswordReset => {
                "You successfully reset your password and you have been logged in automatically."
            }
            Self::PasswordChange => "You successfully changed your password.",
            Self::InvalidConfirmationToken => "Invalid confirmation token.",
            Self::ConfirmationExpired => {
                "You did not confirm your email within {within}. \
                 New instructions to confirm your email have been sent to {email}."
            }
            Self::EmailConfirmed => "Thank you. Your email has been confirmed.",
            Self::AlreadyConfirmed => "Your email has already been confirmed.",
            Self::EmailAlreadyAssociated => "{email} is already associated with an account.",
            Self::InvalidAuthToken => "Invalid authentication token.",
            Self::AuthTokenExpired => "Your session expired after {within}. Please sign in again.",
            Self::PasswordResetRequest => {
                "Instructions to reset your password have been sent to {email}."
            }
            Self::ConfirmationRequest => "Confirmation instructions have been sent to {email}.",
            Self::UserDoesNotExist => "Specified user does not exist.",
        }
    }
}

/// The message catalog: defaults plus configured overrides.
///
/// # Examples
///
/// ```
/// use warden_auth::messages::{MessageKey, Messages};
///
/// let messages = Messages::default();
/// let text = messages.render(
///     MessageKey::PasswordResetExpired,
///     &[("within", "1 milliseconds"), ("email", "joe@lp.com")],
/// );
/// assert!(text.contains("within 1 milliseconds"));
/// assert!(text.contains("joe@lp.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Messages {
    overrides: HashMap<MessageKey, String>,
}

impl Messages {
    /// Builds the catalog from settings.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::ImproperlyConfigured`] if an override names an
    /// unknown message.
    pub fn from_settings(security: &SecuritySettings) -> WardenResult<Self> {
        let mut overrides = HashMap::new();
        for (name, text) in &security.messages {
            let key = MessageKey::from_name(name).ok_or_else(|| {
                WardenError::ImproperlyConfigured(format!("Unknown message override '{name}'"))
            })?;
            overrides.insert(key, text.clone());
        }
        Ok(Self { overrides })
    }

    /// Replaces the text for `key`.
    #[must_use]
    pub fn with_override(mut self, key: MessageKey, text: impl Into<String>) -> Self {
        self.overrides.insert(key, text.into());
        self
    }

    /// The raw text for `key`, placeholders included.
    pub fn get(&self, key: MessageKey) -> &str {
        match self.overrides.get(&key) {
            Some(text) => text,
            None => key.default_text(),
        }
    }

    /// The text for `key` with each `{name}` replaced by its value.
    pub fn render(&self, key: MessageKey, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.get(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}
