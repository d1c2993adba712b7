//! Token resolution failures.

use thiserror::Error;
use warden_core::error::WardenError;
use warden_core::signing::SigningError;

use super::TokenPurpose;
use crate::messages::{MessageKey, Messages};

/// Why a token did not resolve.
///
/// Callers show one generic "invalid token" message for every variant where
/// [`is_invalid`](Self::is_invalid) is true, so a client cannot tell a forged
/// token from a used one. [`TokenError::Expired`] is shown distinctly.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token cannot be parsed or decoded.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The token decodes but no accepted signing scheme produced its signature.
    #[error("Token signature does not match any signing scheme")]
    SignatureMismatch,

    /// The signature is valid but the token is older than its window.
    #[error("{purpose} token was not used within {within}")]
    Expired {
        /// The purpose the token was resolved for.
        purpose: TokenPurpose,
        /// The configured window, as written in settings.
        within: String,
        /// The contact address of the token's owner.
        email: String,
    },

    /// The token's identity no longer resolves to a user.
    #[error("Token identity does not resolve to a user")]
    UnknownIdentity,

    /// The identity's invalidation marker is newer than the token.
    #[error("Token has been superseded")]
    Stale,

    /// The user store failed.
    #[error(transparent)]
    Store(#[from] WardenError),
}

impl TokenError {
    /// Whether this is one of the failures shown as a generic "invalid token".
    pub const fn is_invalid(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_) | Self::SignatureMismatch | Self::UnknownIdentity | Self::Stale
        )
    }

    /// Whether the token expired.
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }

    /// A short label for logs. Never includes token text.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::SignatureMismatch => "signature_mismatch",
            Self::Expired { .. } => "expired",
            Self::UnknownIdentity => "unknown_identity",
            Self::Stale => "stale",
            Self::Store(_) => "store",
        }
    }

    /// The text to show the user for a failure while resolving a `purpose` token.
    ///
    /// Store failures are reported like an invalid token.
    pub fn user_message(&self, purpose: TokenPurpose, messages: &Messages) -> String {
        match self {
            Self::Expired { within, email, .. } => {
                let key = match purpose {
                    TokenPurpose::Reset => MessageKey::PasswordResetExpired,
                    TokenPurpose::Confirm => MessageKey::ConfirmationExpired,
                    TokenPurpose::Auth => MessageKey::AuthTokenExpired,
                };
                messages.render(key, &[("within", within.as_str()), ("email", email.as_str())])
            }
            _ => {
                let key = match purpose {
                    TokenPurpose::Reset => MessageKey::InvalidResetPasswordToken,
                    TokenPurpose::Confirm => MessageKey::InvalidConfirmationToken,
                    TokenPurpose::Auth => MessageKey::InvalidAuthToken,
                };
                messages.get(key).to_string()
            }
        }
    }

    /// Maps a signature failure that carries no payload.
    pub(crate) fn from_signing(error: SigningError) -> Self {
        match error {
            SigningError::Malformed(reason) => Self::Malformed(reason),
            SigningError::SignatureMismatch => Self::SignatureMismatch,
            SigningError::Expired { .. } => Self::Malformed("Unexpected expiry".to_string()),
            SigningError::Serialization(reason) => {
                Self::Store(WardenError::SerializationError(reason))
            }
        }
    }
}
