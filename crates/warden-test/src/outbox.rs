//! Notification capture outbox for testing token delivery.
//!
//! [`NotificationOutbox`] is a [`NotificationSender`] that stores every
//! delivery in memory instead of sending it. Tests hand it to the
//! [`TokenService`](warden_auth::TokenService) builder and read the captured
//! tokens back out.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_auth::{MemoryUserStore, TokenService};
//! use warden_core::Settings;
//! use warden_test::outbox::NotificationOutbox;
//!
//! let outbox = NotificationOutbox::new();
//! let service = TokenService::builder(Settings::default())
//!     .store(Arc::new(MemoryUserStore::new()))
//!     .sender(Arc::new(outbox.clone()))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warden_auth::{NotificationSender, TokenPurpose, UserRecord};
use warden_core::WardenResult;

/// A captured delivery.
#[derive(Debug, Clone)]
pub struct Notification {
    /// What the token is for.
    pub purpose: TokenPurpose,
    /// The recipient, as passed to the sender.
    pub user: UserRecord,
    /// The delivered token.
    pub token: String,
}

/// An in-memory outbox that captures deliveries for test verification.
///
/// Thread-safe via `Arc<Mutex<...>>`; clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct NotificationOutbox {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationOutbox {
    /// Creates a new empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("NotificationOutbox lock poisoned")
            .clone()
    }

    /// Returns the captured notifications for `purpose`.
    pub fn for_purpose(&self, purpose: TokenPurpose) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.purpose == purpose)
            .collect()
    }

    /// Returns the tokens delivered for `purpose`, oldest first.
    pub fn tokens(&self, purpose: TokenPurpose) -> Vec<String> {
        self.for_purpose(purpose).into_iter().map(|n| n.token).collect()
    }

    /// Returns the most recent token delivered to `email` for `purpose`.
    pub fn last_token_for(&self, email: &str, purpose: TokenPurpose) -> Option<String> {
        self.for_purpose(purpose)
            .into_iter()
            .rev()
            .find(|n| n.user.has_email(email))
            .map(|n| n.token)
    }

    /// Returns the number of captured notifications.
    pub fn len(&self) -> usize {
        self.notifications
            .lock()
            .expect("NotificationOutbox lock poisoned")
            .len()
    }

    /// Returns `true` if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all captured notifications.
    pub fn clear(&self) {
        self.notifications
            .lock()
            .expect("NotificationOutbox lock poisoned")
            .clear();
    }

    /// Asserts that exactly `expected` notifications were captured.
    ///
    /// # Panics
    ///
    /// Panics if the count does not match.
    pub fn assert_count(&self, expected: usize) {
        let actual = self.len();
        assert_eq!(
            actual, expected,
            "Expected {expected} notification(s), but {actual} were sent"
        );
    }

    /// Asserts that a `purpose` notification was sent to `email`.
    ///
    /// # Panics
    ///
    /// Panics if none was found.
    pub fn assert_sent_to(&self, email: &str, purpose: TokenPurpose) {
        let sent = self.for_purpose(purpose);
        assert!(
            sent.iter().any(|n| n.user.has_email(email)),
            "No {purpose} notification was sent to '{email}'. Sent to: {:?}",
            sent.iter().map(|n| &n.user.email).collect::<Vec<_>>()
        );
    }
}

#[async_trait]
impl NotificationSender for NotificationOutbox {
    async fn send(&self, purpose: TokenPurpose, user: &UserRecord, token: &str) -> WardenResult<()> {
        self.notifications
            .lock()
            .expect("NotificationOutbox lock poisoned")
            .push(Notification {
                purpose,
                user: user.clone(),
                token: token.to_string(),
            });
        Ok(())
    }
}
