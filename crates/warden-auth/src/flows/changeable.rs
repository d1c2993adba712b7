//! Authenticated password change.

use super::{user_event, FlowError, Notice, PasswordUpdated};
use crate::tokens::TokenService;
use crate::user::UserRecord;

impl TokenService {
    /// Replaces the password of a signed-in user.
    ///
    /// Outstanding reset tokens are retired. Outstanding auth tokens are
    /// retired too when `auth_token_invalidate_on_password_change` is set; the
    /// returned auth token replaces them.
    pub async fn change_password(
        &self,
        user: &UserRecord,
        new_password: &str,
    ) -> Result<PasswordUpdated, FlowError> {
        let user = self.update_password(user, new_password).await?;
        self.signals.password_changed.send(&user_event(&user));
        tracing::info!(user_id = user.id, "Password changed");

        let auth_token = self.issue_auth_token(&user).await?;
        Ok(PasswordUpdated {
            user,
            auth_token,
            notice: Notice::PasswordChanged,
        })
    }
}
