//! The token service facade.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use warden_core::error::{WardenError, WardenResult};
use warden_core::settings::Settings;
use warden_signals::TokenSignals;

use super::{Resolved, TokenError, TokenPolicy, TokenPurpose};
use crate::hashers::{Argon2Hasher, PasswordHasher};
use crate::messages::Messages;
use crate::notifications::{LogSender, NotificationSender};
use crate::store::UserStore;
use crate::user::UserRecord;

/// Issues and resolves tokens, and runs the account flows built on them.
///
/// Construct one with [`TokenService::builder`] at startup and share it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warden_auth::store::MemoryUserStore;
/// use warden_auth::tokens::TokenService;
/// use warden_core::Settings;
///
/// let settings = Settings { secret_key: "secret".into(), ..Settings::default() };
/// let service = TokenService::builder(settings)
///     .store(Arc::new(MemoryUserStore::new()))
///     .build()
///     .unwrap();
/// assert_eq!(service.signals().password_reset.receiver_count(), 0);
/// ```
pub struct TokenService {
    pub(crate) settings: Settings,
    pub(crate) policy: TokenPolicy,
    pub(crate) store: Arc<dyn UserStore>,
    pub(crate) hasher: Arc<dyn PasswordHasher>,
    pub(crate) sender: Arc<dyn NotificationSender>,
    pub(crate) messages: Messages,
    pub(crate) signals: TokenSignals,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("policy", &self.policy)
            .field("store", &"<dyn UserStore>")
            .field("hasher", &self.hasher.algorithm())
            .field("sender", &"<dyn NotificationSender>")
            .field("signals", &self.signals)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Starts building a service from `settings`.
    pub fn builder(settings: Settings) -> TokenServiceBuilder {
        TokenServiceBuilder {
            settings,
            store: None,
            hasher: None,
            sender: None,
            messages: None,
        }
    }

    /// The settings the service was built with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The token policy.
    pub const fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// The user store.
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// The password hasher.
    pub fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    /// The message catalog.
    pub const fn messages(&self) -> &Messages {
        &self.messages
    }

    /// The signals fired by the account flows.
    pub const fn signals(&self) -> &TokenSignals {
        &self.signals
    }

    /// Issues a token for `user`.
    pub async fn issue(&self, user: &UserRecord, purpose: TokenPurpose) -> Result<String, TokenError> {
        self.policy.issue(self.store.as_ref(), user, purpose).await
    }

    /// Resolves `token` for `purpose`.
    ///
    /// Single-use callers follow a success with [`consume`](Self::consume).
    pub async fn resolve(&self, token: &str, purpose: TokenPurpose) -> Result<Resolved, TokenError> {
        self.policy.resolve(self.store.as_ref(), token, purpose).await
    }

    /// Retires every outstanding token of `user` for `purpose`.
    pub async fn consume(
        &self,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> Result<DateTime<Utc>, TokenError> {
        Ok(self.store.advance_invalidation_marker(user, purpose).await?)
    }
}

/// Assembles a [`TokenService`].
///
/// The user store is required. The hasher defaults to [`Argon2Hasher`], the
/// sender to [`LogSender`], and messages to the catalog built from settings.
pub struct TokenServiceBuilder {
    settings: Settings,
    store: Option<Arc<dyn UserStore>>,
    hasher: Option<Arc<dyn PasswordHasher>>,
    sender: Option<Arc<dyn NotificationSender>>,
    messages: Option<Messages>,
}

impl fmt::Debug for TokenServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenServiceBuilder")
            .field("has_store", &self.store.is_some())
            .field("has_hasher", &self.hasher.is_some())
            .field("has_sender", &self.sender.is_some())
            .finish_non_exhaustive()
    }
}

impl TokenServiceBuilder {
    /// Sets the user store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the password hasher.
    #[must_use]
    pub fn hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Sets the notification sender.
    #[must_use]
    pub fn sender(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Replaces the message catalog.
    #[must_use]
    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Validates the settings and builds the service.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::ImproperlyConfigured`] if the settings are
    /// invalid, a message override is unknown, or no store was given.
    pub fn build(self) -> WardenResult<TokenService> {
        self.settings.validate()?;
        let store = self.store.ok_or_else(|| {
            WardenError::ImproperlyConfigured("A user store is required".to_string())
        })?;
        let messages = match self.messages {
            Some(messages) => messages,
            None => Messages::from_settings(&self.settings.security)?,
        };
        let policy = TokenPolicy::from_settings(&self.settings)?;

        tracing::info!(
            schemes = self.settings.security.signing_schemes.len(),
            deprecated = self.settings.security.deprecated_signing_schemes.len(),
            "Token service ready"
        );

        Ok(TokenService {
            settings: self.settings,
            policy,
            store,
            hasher: self.hasher.unwrap_or_else(|| Arc::new(Argon2Hasher)),
            sender: self.sender.unwrap_or_else(|| Arc::new(LogSender)),
            messages,
            signals: TokenSignals::new(),
        })
    }
}
