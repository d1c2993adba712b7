//! Email confirmation.

use chrono::Utc;
use warden_signals::TokenEvent;

use super::{user_event, EmailConfirmation, FlowError, InstructionsSent, Notice};
use crate::tokens::{TokenError, TokenPurpose, TokenService};
use crate::user::UserRecord;

impl TokenService {
    /// Issues a confirmation token for `user` and sends it.
    ///
    /// Fails with [`FlowError::AlreadyConfirmed`] if there is nothing to confirm.
    pub async fn send_confirmation_instructions(
        &self,
        user: &UserRecord,
    ) -> Result<InstructionsSent, FlowError> {
        if user.is_confirmed() {
            return Err(FlowError::AlreadyConfirmed);
        }
        let token = self
            .issue(user, TokenPurpose::Confirm)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Confirm, e))?;
        self.sender.send(TokenPurpose::Confirm, user, &token).await?;
        self.signals.confirm_instructions_sent.send(&TokenEvent {
            user_id: user.id,
            email: user.email.clone(),
            token: token.clone(),
        });
        tracing::info!(user_id = user.id, "Sent confirmation instructions");
        Ok(InstructionsSent {
            token,
            notice: Notice::ConfirmationSent {
                email: user.email.clone(),
            },
        })
    }

    /// Confirms the email of the token's owner.
    ///
    /// An expired token causes new instructions to be sent.
    pub async fn confirm_email(&self, token: &str) -> Result<EmailConfirmation, FlowError> {
        let resolved = match self.resolve(token, TokenPurpose::Confirm).await {
            Ok(resolved) => resolved,
            Err(err @ TokenError::Expired { .. }) => {
                if let TokenError::Expired { email, .. } = &err {
                    self.resend_confirmation(email).await;
                }
                return Err(FlowError::token(TokenPurpose::Confirm, err));
            }
            Err(e) => return Err(FlowError::token(TokenPurpose::Confirm, e)),
        };

        if resolved.user.is_confirmed() {
            return Err(FlowError::AlreadyConfirmed);
        }

        self.store.mark_confirmed(&resolved.user, Utc::now()).await?;
        self.consume(&resolved.user, TokenPurpose::Confirm)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Confirm, e))?;

        let user = self.reload(&resolved.user, TokenPurpose::Confirm).await?;
        self.signals.user_confirmed.send(&user_event(&user));
        tracing::info!(user_id = user.id, "Email confirmed");
        Ok(EmailConfirmation {
            user,
            notice: Notice::EmailConfirmed,
        })
    }

    async fn resend_confirmation(&self, email: &str) {
        let user = match self.store.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Could not look up user to resend confirmation");
                return;
            }
        };
        if let Err(e) = self.send_confirmation_instructions(&user).await {
            tracing::warn!(error = %e, "Could not resend confirmation instructions");
        }
    }
}
