//! Token policy: expiry windows, identity binding, and invalidation markers.
//!
//! A token resolves only if all of the following hold:
//!
//! 1. its signature verifies under an accepted signing scheme,
//! 2. it is no older than its purpose's window,
//! 3. its identity reference resolves to a stored user,
//! 4. that user's marker for the purpose is not newer than the token.
//!
//! The policy never advances markers itself. Single-use flows advance the
//! marker after a successful resolution.

use chrono::{DateTime, Utc};
use tracing::Instrument;
use warden_core::error::WardenResult;
use warden_core::logging::token_span;
use warden_core::settings::{SecuritySettings, Settings};
use warden_core::utils::crypto::random_urlsafe;
use warden_core::utils::within::Within;

use super::payload::TokenPayload;
use super::serializer::{Decoded, TokenSerializer, Verified};
use super::{TokenError, TokenPurpose};
use crate::store::UserStore;
use crate::user::{UserId, UserRecord};

/// A successfully resolved token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The token's owner, as currently stored.
    pub user: UserRecord,
    /// The decoded payload.
    pub payload: TokenPayload,
    /// The signing scheme that verified the token.
    pub scheme: String,
    /// Whether a deprecated scheme verified the token.
    pub legacy: bool,
}

/// Issues and resolves tokens against a [`UserStore`].
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    serializer: TokenSerializer,
    security: SecuritySettings,
}

impl TokenPolicy {
    /// Builds the policy from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no signing scheme is configured.
    pub fn from_settings(settings: &Settings) -> WardenResult<Self> {
        Ok(Self {
            serializer: TokenSerializer::from_settings(settings)?,
            security: settings.security.clone(),
        })
    }

    /// The validity window for `purpose`.
    pub const fn window(&self, purpose: TokenPurpose) -> Option<&Within> {
        purpose.within(&self.security)
    }

    /// Issues a token for `user`.
    ///
    /// The issuance time is never earlier than the user's current marker, so a
    /// token minted right after an advance is valid even on a coarse clock.
    pub async fn issue(
        &self,
        store: &dyn UserStore,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> Result<String, TokenError> {
        let marker = store.get_invalidation_marker(user, purpose).await?;
        let issued_at = std::cmp::max(Utc::now(), marker);
        let token = self.issue_at(user.id, purpose, issued_at)?;
        tracing::debug!(user_id = user.id, purpose = %purpose, "Issued token");
        Ok(token)
    }

    /// Issues a token with an explicit issuance time, without consulting the store.
    pub fn issue_at(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let nonce = (purpose == TokenPurpose::Auth).then(|| random_urlsafe(16));
        self.serializer.dumps(&TokenPayload {
            user_id,
            purpose,
            issued_at,
            nonce,
        })
    }

    /// Resolves `token` for `purpose` against the current time.
    pub async fn resolve(
        &self,
        store: &dyn UserStore,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Resolved, TokenError> {
        self.resolve_at(store, token, purpose, Utc::now()).await
    }

    /// Resolves `token` for `purpose` as of `now`.
    pub async fn resolve_at(
        &self,
        store: &dyn UserStore,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Resolved, TokenError> {
        let result = self
            .check(store, token, purpose, now)
            .instrument(token_span("resolve", purpose.as_str()))
            .await;
        if let Err(err) = &result {
            tracing::info!(purpose = %purpose, kind = err.kind(), "Token rejected");
        }
        result
    }

    async fn check(
        &self,
        store: &dyn UserStore,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Resolved, TokenError> {
        let window = self.window(purpose);
        let decoded = self
            .serializer
            .loads(token, purpose, window.map(Within::duration), now)?;

        let Verified {
            payload,
            scheme,
            legacy,
        } = match decoded {
            Decoded::Fresh(verified) => verified,
            Decoded::Expired(payload) => {
                let user = store
                    .find_by_identity(payload.user_id)
                    .await?
                    .ok_or(TokenError::UnknownIdentity)?;
                return Err(TokenError::Expired {
                    purpose,
                    within: window.map(Within::to_string).unwrap_or_default(),
                    email: user.email,
                });
            }
        };

        let user = store
            .find_by_identity(payload.user_id)
            .await?
            .ok_or(TokenError::UnknownIdentity)?;

        let marker = store.get_invalidation_marker(&user, purpose).await?;
        if marker > payload.issued_at {
            return Err(TokenError::Stale);
        }

        if legacy {
            tracing::warn!(purpose = %purpose, scheme = %scheme, "Token verified with a deprecated signing scheme");
        }

        Ok(Resolved {
            user,
            payload,
            scheme,
            legacy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryUserStore, NewUser};
    use chrono::Duration;

    fn settings() -> Settings {
        let mut s = Settings {
            secret_key: "secret".to_string(),
            ..Settings::default()
        };
        s.security.reset_password_within = "1 hours".parse().unwrap();
        s
    }

    async fn setup() -> (TokenPolicy, MemoryUserStore, UserRecord) {
        let policy = TokenPolicy::from_settings(&settings()).unwrap();
        let store = MemoryUserStore::new();
        let joe = store
            .create_user(NewUser::new("joe@lp.com", "plaintext$password"))
            .await
            .unwrap();
        (policy, store, joe)
    }

    // ── Happy path ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let (policy, store, joe) = setup().await;
        for purpose in TokenPurpose::ALL {
            let token = policy.issue(&store, &joe, purpose).await.unwrap();
            let resolved = policy.resolve(&store, &token, purpose).await.unwrap();
            assert_eq!(resolved.user.id, joe.id);
            assert_eq!(resolved.payload.purpose, purpose);
            assert!(!resolved.legacy);
        }
    }

    #[tokio::test]
    async fn test_auth_tokens_carry_nonce() {
        let (policy, store, joe) = setup().await;
        let a = policy.issue(&store, &joe, TokenPurpose::Auth).await.unwrap();
        let b = policy.issue(&store, &joe, TokenPurpose::Auth).await.unwrap();
        assert_ne!(a, b);
        let resolved = policy.resolve(&store, &a, TokenPurpose::Auth).await.unwrap();
        assert!(resolved.payload.nonce.is_some());
    }

    // ── Expiry ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_expired_carries_window_and_email() {
        let (policy, store, joe) = setup().await;
        let token = policy.issue(&store, &joe, TokenPurpose::Reset).await.unwrap();

        let later = Utc::now() + Duration::hours(2);
        let err = policy
            .resolve_at(&store, &token, TokenPurpose::Reset, later)
            .await
            .unwrap_err();
        match err {
            TokenError::Expired {
                purpose,
                within,
                email,
            } => {
                assert_eq!(purpose, TokenPurpose::Reset);
                assert_eq!(within, "1 hours");
                assert_eq!(email, "joe@lp.com");
            }
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_for_deleted_user_is_unknown_identity() {
        let (policy, store, joe) = setup().await;
        let token = policy.issue(&store, &joe, TokenPurpose::Reset).await.unwrap();
        store.delete_user(joe.id).await;

        let later = Utc::now() + Duration::hours(2);
        let err = policy
            .resolve_at(&store, &token, TokenPurpose::Reset, later)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::UnknownIdentity));
    }

    #[tokio::test]
    async fn test_unbounded_auth_window() {
        let (policy, store, joe) = setup().await;
        let token = policy.issue(&store, &joe, TokenPurpose::Auth).await.unwrap();
        let much_later = Utc::now() + Duration::days(3650);
        assert!(policy
            .resolve_at(&store, &token, TokenPurpose::Auth, much_later)
            .await
            .is_ok());
    }

    // ── Identity binding ────────────────────────────────────────────

    #[tokio::test]
    async fn test_deleted_user() {
        let (policy, store, joe) = setup().await;
        let token = policy.issue(&store, &joe, TokenPurpose::Confirm).await.unwrap();
        store.delete_user(joe.id).await;
        let err = policy
            .resolve(&store, &token, TokenPurpose::Confirm)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::UnknownIdentity));
    }

    #[tokio::test]
    async fn test_token_for_never_existing_user() {
        let (policy, store, _) = setup().await;
        let token = policy.issue_at(999, TokenPurpose::Reset, Utc::now()).unwrap();
        let err = policy
            .resolve(&store, &token, TokenPurpose::Reset)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::UnknownIdentity));
    }

    // ── Invalidation markers ────────────────────────────────────────

    #[tokio::test]
    async fn test_advanced_marker_makes_token_stale() {
        let (policy, store, joe) = setup().await;
        let token = policy.issue(&store, &joe, TokenPurpose::Reset).await.unwrap();
        assert!(policy.resolve(&store, &token, TokenPurpose::Reset).await.is_ok());

        store
            .advance_invalidation_marker(&joe, TokenPurpose::Reset)
            .await
            .unwrap();
        let err = policy
            .resolve(&store, &token, TokenPurpose::Reset)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Stale));
    }

    #[tokio::test]
    async fn test_token_issued_after_advance_is_valid() {
        let (policy, store, joe) = setup().await;
        store
            .advance_invalidation_marker(&joe, TokenPurpose::Auth)
            .await
            .unwrap();
        let token = policy.issue(&store, &joe, TokenPurpose::Auth).await.unwrap();
        assert!(policy.resolve(&store, &token, TokenPurpose::Auth).await.is_ok());
    }

    #[tokio::test]
    async fn test_token_issued_before_account_creation_fails_closed() {
        let (policy, store, joe) = setup().await;
        let before = joe.created_at - Duration::seconds(1);
        let token = policy.issue_at(joe.id, TokenPurpose::Reset, before).unwrap();
        let err = policy
            .resolve(&store, &token, TokenPurpose::Reset)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Stale));
    }

    #[tokio::test]
    async fn test_markers_are_per_purpose() {
        let (policy, store, joe) = setup().await;
        let auth = policy.issue(&store, &joe, TokenPurpose::Auth).await.unwrap();
        store
            .advance_invalidation_marker(&joe, TokenPurpose::Reset)
            .await
            .unwrap();
        assert!(policy.resolve(&store, &auth, TokenPurpose::Auth).await.is_ok());
    }

    // ── Purpose binding ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_cross_purpose_replay() {
        let (policy, store, joe) = setup().await;
        let reset = policy.issue(&store, &joe, TokenPurpose::Reset).await.unwrap();
        let confirm = policy.issue(&store, &joe, TokenPurpose::Confirm).await.unwrap();

        assert!(policy
            .resolve(&store, &reset, TokenPurpose::Confirm)
            .await
            .unwrap_err()
            .is_invalid());
        assert!(policy
            .resolve(&store, &confirm, TokenPurpose::Reset)
            .await
            .unwrap_err()
            .is_invalid());
    }
}
