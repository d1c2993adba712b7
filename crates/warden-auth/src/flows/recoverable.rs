//! Password recovery.
//!
//! A user asks for reset instructions by email, receives a single-use reset
//! token, and trades it for a new password. An expired token triggers a
//! fresh set of instructions, so the user is not left stranded.

use warden_signals::TokenEvent;

use super::{user_event, FlowError, InstructionsSent, Notice, PasswordUpdated};
use crate::tokens::{Resolved, TokenError, TokenPurpose, TokenService};
use crate::user::UserRecord;

impl TokenService {
    /// Issues a reset token for the account using `email` and sends it.
    ///
    /// Returns the issued token and the notice naming the recipient.
    pub async fn send_reset_password_instructions(
        &self,
        email: &str,
    ) -> Result<InstructionsSent, FlowError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| FlowError::UnknownEmail {
                email: email.to_string(),
            })?;
        self.send_reset_password_instructions_to(&user).await
    }

    /// Issues a reset token for `user` and sends it.
    pub async fn send_reset_password_instructions_to(
        &self,
        user: &UserRecord,
    ) -> Result<InstructionsSent, FlowError> {
        let token = self
            .issue(user, TokenPurpose::Reset)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Reset, e))?;
        self.sender.send(TokenPurpose::Reset, user, &token).await?;
        self.signals
            .reset_password_instructions_sent
            .send(&TokenEvent {
                user_id: user.id,
                email: user.email.clone(),
                token: token.clone(),
            });
        tracing::info!(user_id = user.id, "Sent reset password instructions");
        Ok(InstructionsSent {
            token,
            notice: Notice::ResetInstructionsSent {
                email: user.email.clone(),
            },
        })
    }

    /// Checks a reset token without using it, e.g. before showing a reset form.
    ///
    /// An expired token causes new instructions to be sent.
    pub async fn reset_password_token_status(&self, token: &str) -> Result<UserRecord, FlowError> {
        Ok(self.resolve_reset(token).await?.user)
    }

    /// Sets a new password using a reset token.
    ///
    /// Retires the token (and every other outstanding reset token), retires
    /// outstanding auth tokens when configured to, and returns a fresh auth
    /// token. An expired token causes new instructions to be sent.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<PasswordUpdated, FlowError> {
        let resolved = self.resolve_reset(token).await?;
        let user = self.update_password(&resolved.user, new_password).await?;
        self.signals.password_reset.send(&user_event(&user));
        tracing::info!(user_id = user.id, "Password reset");

        let auth_token = self.issue_auth_token(&user).await?;
        Ok(PasswordUpdated {
            user,
            auth_token,
            notice: Notice::PasswordReset,
        })
    }

    async fn resolve_reset(&self, token: &str) -> Result<Resolved, FlowError> {
        match self.resolve(token, TokenPurpose::Reset).await {
            Ok(resolved) => Ok(resolved),
            Err(TokenError::Expired {
                purpose,
                within,
                email,
            }) => {
                self.resend_after_expiry(&email).await;
                Err(FlowError::token(
                    TokenPurpose::Reset,
                    TokenError::Expired {
                        purpose,
                        within,
                        email,
                    },
                ))
            }
            Err(e) => Err(FlowError::token(TokenPurpose::Reset, e)),
        }
    }

    async fn resend_after_expiry(&self, email: &str) {
        if let Err(e) = self.send_reset_password_instructions(email).await {
            tracing::warn!(error = %e, "Could not resend reset password instructions");
        }
    }

    /// Hashes and stores `new_password`, then advances the reset marker and,
    /// when configured, the auth marker. Returns the reloaded user.
    pub(crate) async fn update_password(
        &self,
        user: &UserRecord,
        new_password: &str,
    ) -> Result<UserRecord, FlowError> {
        let hash = self.hasher.hash(new_password).await?;
        self.store.set_password(user, &hash).await?;
        self.store
            .advance_invalidation_marker(user, TokenPurpose::Reset)
            .await?;
        if self.settings.security.auth_token_invalidate_on_password_change {
            self.store
                .advance_invalidation_marker(user, TokenPurpose::Auth)
                .await?;
        }
        self.reload(user, TokenPurpose::Reset).await
    }

    pub(crate) async fn reload(
        &self,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> Result<UserRecord, FlowError> {
        self.store
            .find_by_identity(user.id)
            .await?
            .ok_or_else(|| FlowError::token(purpose, TokenError::UnknownIdentity))
    }
}
