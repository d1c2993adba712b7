//! Authentication tokens.
//!
//! Auth tokens are reusable: verifying one does not retire it. They are
//! retired together by advancing the auth marker, which happens on password
//! change (when configured) or on explicit revocation.

use chrono::{DateTime, Utc};
use warden_signals::TokenEvent;

use super::FlowError;
use crate::tokens::{TokenError, TokenPurpose, TokenService};
use crate::user::UserRecord;

/// A verified auth token.
#[derive(Debug, Clone)]
pub struct AuthTokenCheck {
    /// The token's owner.
    pub user: UserRecord,
    /// A replacement signed with the current scheme, when a deprecated scheme
    /// verified the presented token. It keeps the original issuance time.
    pub upgraded: Option<String>,
}

impl TokenService {
    /// Issues an auth token for `user`.
    pub async fn issue_auth_token(&self, user: &UserRecord) -> Result<String, FlowError> {
        let token = self
            .issue(user, TokenPurpose::Auth)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Auth, e))?;
        self.signals.auth_token_issued.send(&TokenEvent {
            user_id: user.id,
            email: user.email.clone(),
            token: token.clone(),
        });
        Ok(token)
    }

    /// Verifies an auth token.
    ///
    /// Inactive accounts are treated as unknown.
    pub async fn verify_auth_token(&self, token: &str) -> Result<AuthTokenCheck, FlowError> {
        let resolved = self
            .resolve(token, TokenPurpose::Auth)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Auth, e))?;

        if !resolved.user.active {
            tracing::info!(user_id = resolved.user.id, "Auth token for inactive user");
            return Err(FlowError::token(TokenPurpose::Auth, TokenError::UnknownIdentity));
        }

        let upgraded = if resolved.legacy {
            let token = self
                .policy
                .issue_at(resolved.user.id, TokenPurpose::Auth, resolved.payload.issued_at)
                .map_err(|e| FlowError::token(TokenPurpose::Auth, e))?;
            tracing::debug!(user_id = resolved.user.id, from = %resolved.scheme, "Upgraded auth token");
            Some(token)
        } else {
            None
        };

        Ok(AuthTokenCheck {
            user: resolved.user,
            upgraded,
        })
    }

    /// Retires every outstanding auth token of `user` ("log out everywhere").
    pub async fn revoke_auth_tokens(&self, user: &UserRecord) -> Result<DateTime<Utc>, FlowError> {
        let marker = self
            .consume(user, TokenPurpose::Auth)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Auth, e))?;
        tracing::info!(user_id = user.id, "Revoked auth tokens");
        Ok(marker)
    }
}
