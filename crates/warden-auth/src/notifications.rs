//! Delivery of issued tokens to their owners.
//!
//! The token flows hand every freshly issued reset and confirmation token to
//! a [`NotificationSender`], which typically renders a link and emails it.

use async_trait::async_trait;
use warden_core::error::WardenResult;

use crate::tokens::TokenPurpose;
use crate::user::UserRecord;

/// Sends an issued token to the user it belongs to.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Delivers `token` for `purpose` to `user`.
    async fn send(&self, purpose: TokenPurpose, user: &UserRecord, token: &str) -> WardenResult<()>;
}

/// A sender that only records deliveries in the log.
///
/// The token text is never logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, purpose: TokenPurpose, user: &UserRecord, _token: &str) -> WardenResult<()> {
        tracing::info!(user_id = user.id, purpose = %purpose, "Notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_log_sender_accepts_everything() {
        let user = UserRecord::new(1, "matt@lp.com", "", Utc::now());
        for purpose in TokenPurpose::ALL {
            assert!(LogSender.send(purpose, &user, "a.b.c").await.is_ok());
        }
    }
}
