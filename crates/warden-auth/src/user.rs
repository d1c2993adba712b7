//! The user record seen by the token core.
//!
//! A [`UserRecord`] is the store's view of an account: identity, contact
//! address, password hash, and the per-purpose invalidation markers that
//! retire previously issued tokens.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tokens::TokenPurpose;

/// Stable identity reference of a user. Never reused after deletion.
pub type UserId = u64;

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// The identity reference embedded in tokens.
    pub id: UserId,
    /// The contact address, shown in "expired" messages.
    pub email: String,
    /// The encoded password hash. Empty or `!`-prefixed means unusable.
    pub password: String,
    /// Whether the account may sign in.
    pub active: bool,
    /// When the email address was confirmed, if ever.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Per-purpose invalidation markers. Tokens issued before a marker are stale.
    #[serde(default)]
    pub markers: HashMap<TokenPurpose, DateTime<Utc>>,
}

impl UserRecord {
    /// Creates an active, unconfirmed record created at `created_at`.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        password: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            password: password.into(),
            active: true,
            confirmed_at: None,
            created_at,
            markers: HashMap::new(),
        }
    }

    /// The invalidation marker for `purpose`.
    ///
    /// An account that has never advanced a marker uses its creation time, so
    /// tokens claiming an earlier issuance never resolve.
    pub fn marker(&self, purpose: TokenPurpose) -> DateTime<Utc> {
        self.markers
            .get(&purpose)
            .copied()
            .unwrap_or(self.created_at)
    }

    /// Whether the email address has been confirmed.
    pub const fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Whether `email` names this account, ignoring ASCII case.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}
