//! Token payloads and their wire form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenPurpose;
use crate::user::UserId;

/// What a token says once its signature has been checked.
///
/// `issued_at` comes from the signed timestamp segment, so it is covered by
/// the same signature as the claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// The identity the token was issued to.
    pub user_id: UserId,
    /// What the token may be used for.
    pub purpose: TokenPurpose,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// Random per-token value, present on auth tokens.
    pub nonce: Option<String>,
}

impl TokenPayload {
    pub(crate) fn from_claims(claims: Claims, issued_at: DateTime<Utc>) -> Self {
        Self {
            user_id: claims.user_id,
            purpose: claims.purpose,
            issued_at,
            nonce: claims.nonce,
        }
    }

    pub(crate) fn claims(&self) -> Claims {
        Claims {
            user_id: self.user_id,
            purpose: self.purpose,
            nonce: self.nonce.clone(),
        }
    }
}

/// The JSON object carried in the first token segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Claims {
    #[serde(rename = "u")]
    pub user_id: UserId,
    #[serde(rename = "p")]
    pub purpose: TokenPurpose,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}
