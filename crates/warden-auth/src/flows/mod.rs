//! Account flows built on the token service.
//!
//! Each submodule adds methods to [`TokenService`](crate::tokens::TokenService):
//!
//! - [`recoverable`]: password-reset instructions and reset
//! - [`confirmable`]: email confirmation
//! - [`auth_tokens`]: auth token issue, verification, and revocation
//! - [`changeable`]: authenticated password change
//! - [`createable`]: accounts created on a user's behalf

pub mod auth_tokens;
pub mod changeable;
pub mod confirmable;
pub mod createable;
pub mod recoverable;

use thiserror::Error;
use warden_core::error::WardenError;
use warden_signals::UserEvent;

use crate::messages::{MessageKey, Messages};
use crate::tokens::{TokenError, TokenPurpose};
use crate::user::UserRecord;

/// Why an account flow failed.
#[derive(Error, Debug)]
pub enum FlowError {
    /// A token did not resolve.
    #[error("{purpose} token rejected: {source}")]
    Token {
        /// The purpose the token was presented for.
        purpose: TokenPurpose,
        /// The underlying failure.
        source: TokenError,
    },

    /// No account uses the given email.
    #[error("No account is associated with {email}")]
    UnknownEmail {
        /// The email that was looked up.
        email: String,
    },

    /// Another account already uses the email.
    #[error("{email} is already associated with an account")]
    EmailAlreadyAssociated {
        /// The email that was requested.
        email: String,
    },

    /// The email had already been confirmed.
    #[error("Email already confirmed")]
    AlreadyConfirmed,

    /// The store, hasher, or sender failed.
    #[error(transparent)]
    Internal(#[from] WardenError),
}

impl FlowError {
    /// Store failures surface as [`FlowError::Internal`], not as token failures.
    pub(crate) fn token(purpose: TokenPurpose, source: TokenError) -> Self {
        match source {
            TokenError::Store(error) => Self::Internal(error),
            source => Self::Token { purpose, source },
        }
    }

    /// The token failure, if this was one.
    pub const fn token_error(&self) -> Option<&TokenError> {
        match self {
            Self::Token { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The text to show the user, or `None` for internal failures.
    pub fn user_message(&self, messages: &Messages) -> Option<String> {
        match self {
            Self::Token { purpose, source } => Some(source.user_message(*purpose, messages)),
            Self::UnknownEmail { .. } => Some(messages.get(MessageKey::UserDoesNotExist).to_string()),
            Self::EmailAlreadyAssociated { email } => Some(
                messages.render(MessageKey::EmailAlreadyAssociated, &[("email", email.as_str())]),
            ),
            Self::AlreadyConfirmed => Some(messages.get(MessageKey::AlreadyConfirmed).to_string()),
            Self::Internal(_) => None,
        }
    }
}

/// What to tell the user after a flow succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Reset instructions went out to `email`.
    ResetInstructionsSent {
        /// The recipient.
        email: String,
    },
    /// Confirmation instructions went out to `email`.
    ConfirmationSent {
        /// The recipient.
        email: String,
    },
    /// The password was reset and the user holds a fresh auth token.
    PasswordReset,
    /// A signed-in user changed their password.
    PasswordChanged,
    /// The email was confirmed.
    EmailConfirmed,
}

impl Notice {
    /// The catalog entry for this notice.
    pub const fn key(&self) -> MessageKey {
        match self {
            Self::ResetInstructionsSent { .. } => MessageKey::PasswordResetRequest,
            Self::ConfirmationSent { .. } => MessageKey::ConfirmationRequest,
            Self::PasswordReset => MessageKey::PasswordReset,
            Self::PasswordChanged => MessageKey::PasswordChange,
            Self::EmailConfirmed => MessageKey::EmailConfirmed,
        }
    }

    /// The text to show the user.
    pub fn user_message(&self, messages: &Messages) -> String {
        match self {
            Self::ResetInstructionsSent { email } | Self::ConfirmationSent { email } => {
                messages.render(self.key(), &[("email", email.as_str())])
            }
            _ => messages.get(self.key()).to_string(),
        }
    }
}

/// The result of sending reset or confirmation instructions.
#[derive(Debug, Clone)]
pub struct InstructionsSent {
    /// The delivered token.
    pub token: String,
    /// Names the recipient.
    pub notice: Notice,
}

/// The result of a password reset or change.
#[derive(Debug, Clone)]
pub struct PasswordUpdated {
    /// The user, reloaded after the update.
    pub user: UserRecord,
    /// A fresh auth token, valid after any invalidation the update caused.
    pub auth_token: String,
    /// [`Notice::PasswordReset`] or [`Notice::PasswordChanged`].
    pub notice: Notice,
}

/// The result of confirming an email.
#[derive(Debug, Clone)]
pub struct EmailConfirmation {
    /// The user, reloaded after confirmation.
    pub user: UserRecord,
    /// Always [`Notice::EmailConfirmed`].
    pub notice: Notice,
}

pub(crate) fn user_event(user: &UserRecord) -> UserEvent {
    UserEvent {
        user_id: user.id,
        email: user.email.clone(),
    }
}
