//! User persistence for the token core.
//!
//! [`UserStore`] is the single capability the token service needs from a
//! persistence layer. Any backend (relational, document, key-value)
//! implements it; [`MemoryUserStore`] keeps everything in memory for tests
//! and small deployments.
//!
//! ## Invalidation markers
//!
//! Each user carries one marker per [`TokenPurpose`]. A token whose issuance
//! time is earlier than the marker is stale. Advancing a marker moves it
//! strictly forward, to just after the current time.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use warden_core::error::{WardenError, WardenResult};

use crate::tokens::TokenPurpose;
use crate::user::{UserId, UserRecord};

/// The fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The contact address. Unique, ignoring ASCII case.
    pub email: String,
    /// The encoded password hash.
    pub password: String,
    /// Whether the account may sign in.
    pub active: bool,
    /// Pre-confirmed accounts carry their confirmation time.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl NewUser {
    /// An active, unconfirmed account.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            active: true,
            confirmed_at: None,
        }
    }

    /// Marks the account as confirmed at `at`.
    #[must_use]
    pub const fn confirmed(mut self, at: DateTime<Utc>) -> Self {
        self.confirmed_at = Some(at);
        self
    }

    /// Marks the account as inactive.
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Persistence operations used by the token service.
///
/// Implementations must be `Send + Sync`. Marker advancement is a
/// read-then-write; implementations apply it under whatever isolation the
/// backend offers.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks a user up by identity reference.
    async fn find_by_identity(&self, id: UserId) -> WardenResult<Option<UserRecord>>;

    /// Looks a user up by email, ignoring ASCII case.
    async fn find_by_email(&self, email: &str) -> WardenResult<Option<UserRecord>>;

    /// The current invalidation marker of `user` for `purpose`.
    async fn get_invalidation_marker(
        &self,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> WardenResult<DateTime<Utc>>;

    /// Advances the marker of `user` for `purpose`, retiring every token
    /// issued so far. Returns the new marker.
    async fn advance_invalidation_marker(
        &self,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> WardenResult<DateTime<Utc>>;

    /// Replaces the stored password hash.
    async fn set_password(&self, user: &UserRecord, password_hash: &str) -> WardenResult<()>;

    /// Records that the user's email was confirmed at `at`.
    async fn mark_confirmed(&self, user: &UserRecord, at: DateTime<Utc>) -> WardenResult<()>;

    /// Creates an account.
    ///
    /// Fails with [`WardenError::Conflict`] if the email is already taken.
    async fn create_user(&self, new_user: NewUser) -> WardenResult<UserRecord>;
}

/// The next marker after `previous`, no earlier than just after `now`.
pub fn next_marker(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let tick = Duration::nanoseconds(1);
    std::cmp::max(now, previous) + tick
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, UserRecord>,
    last_id: UserId,
}

/// An in-memory [`UserStore`].
///
/// Cloning shares the underlying map.
///
/// # Examples
///
/// ```
/// use warden_auth::store::{MemoryUserStore, NewUser, UserStore};
///
/// # tokio_test_block(async {
/// let store = MemoryUserStore::new();
/// let user = store.create_user(NewUser::new("matt@lp.com", "plaintext$password")).await.unwrap();
/// assert_eq!(store.find_by_email("MATT@lp.com").await.unwrap().unwrap().id, user.id);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user. Their identity reference is never handed out again.
    ///
    /// Returns `true` if the user existed.
    pub async fn delete_user(&self, id: UserId) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }

    /// Replaces a stored record.
    ///
    /// Invalidation markers and the creation time are never moved backwards:
    /// each stored marker is kept unless `record` carries a later one.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::DoesNotExist`] if no user has `record.id`.
    pub async fn save(&self, mut record: UserRecord) -> WardenResult<()> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .users
            .get_mut(&record.id)
            .ok_or_else(|| does_not_exist(record.id))?;
        for (purpose, stored) in &slot.markers {
            let marker = record
                .markers
                .get(purpose)
                .map_or(*stored, |incoming| std::cmp::max(*incoming, *stored));
            record.markers.insert(*purpose, marker);
        }
        record.created_at = slot.created_at;
        *slot = record;
        Ok(())
    }

    /// Every stored user, ordered by identity.
    pub async fn all(&self) -> Vec<UserRecord> {
        self.inner.read().await.users.values().cloned().collect()
    }

    /// The number of stored users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.users.is_empty()
    }
}

fn does_not_exist(id: UserId) -> WardenError {
    WardenError::DoesNotExist(format!("User {id} does not exist"))
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl UserStore for MemoryUserStore {
    async fn find_by_identity(&self, id: UserId) -> WardenResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> WardenResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.has_email(email)).cloned())
    }

    async fn get_invalidation_marker(
        &self,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> WardenResult<DateTime<Utc>> {
        let inner = self.inner.read().await;
        let record = inner.users.get(&user.id).ok_or_else(|| does_not_exist(user.id))?;
        Ok(record.marker(purpose))
    }

    async fn advance_invalidation_marker(
        &self,
        user: &UserRecord,
        purpose: TokenPurpose,
    ) -> WardenResult<DateTime<Utc>> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| does_not_exist(user.id))?;
        let marker = next_marker(record.marker(purpose), Utc::now());
        record.markers.insert(purpose, marker);
        tracing::debug!(user_id = user.id, purpose = %purpose, "Advanced invalidation marker");
        Ok(marker)
    }

    async fn set_password(&self, user: &UserRecord, password_hash: &str) -> WardenResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| does_not_exist(user.id))?;
        record.password = password_hash.to_string();
        Ok(())
    }

    async fn mark_confirmed(&self, user: &UserRecord, at: DateTime<Utc>) -> WardenResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| does_not_exist(user.id))?;
        record.confirmed_at = Some(at);
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> WardenResult<UserRecord> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.has_email(&new_user.email)) {
            return Err(WardenError::Conflict(format!(
                "{} is already associated with an account",
                new_user.email
            )));
        }

        inner.last_id += 1;
        let mut record = UserRecord::new(
            inner.last_id,
            new_user.email.trim(),
            new_user.password,
            Utc::now(),
        );
        record.active = new_user.active;
        record.confirmed_at = new_user.confirmed_at;
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_matt() -> (MemoryUserStore, UserRecord) {
        let store = MemoryUserStore::new();
        let matt = store
            .create_user(NewUser::new("matt@lp.com", "plaintext$password"))
            .await
            .unwrap();
        (store, matt)
    }

    // ── Creation and lookup ─────────────────────────────────────────

    #[tokio::test]
    async fn test_create_and_find() {
        let (store, matt) = store_with_matt().await;
        assert_eq!(matt.id, 1);
        assert_eq!(store.find_by_identity(1).await.unwrap(), Some(matt.clone()));
        assert_eq!(store.find_by_email("Matt@LP.com").await.unwrap(), Some(matt));
        assert!(store.find_by_identity(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (store, _) = store_with_matt().await;
        let err = store
            .create_user(NewUser::new("MATT@lp.com", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let (store, matt) = store_with_matt().await;
        assert!(store.delete_user(matt.id).await);
        assert!(!store.delete_user(matt.id).await);
        let joe = store.create_user(NewUser::new("joe@lp.com", "x")).await.unwrap();
        assert_ne!(joe.id, matt.id);
    }

    #[tokio::test]
    async fn test_new_user_options() {
        let store = MemoryUserStore::new();
        let at = Utc::now();
        let user = store
            .create_user(NewUser::new("tiya@lp.com", "x").inactive().confirmed(at))
            .await
            .unwrap();
        assert!(!user.active);
        assert_eq!(user.confirmed_at, Some(at));
    }

    // ── Markers ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_marker_defaults_to_creation() {
        let (store, matt) = store_with_matt().await;
        let marker = store
            .get_invalidation_marker(&matt, TokenPurpose::Reset)
            .await
            .unwrap();
        assert_eq!(marker, matt.created_at);
    }

    #[tokio::test]
    async fn test_advance_marker_moves_forward_per_purpose() {
        let (store, matt) = store_with_matt().await;
        let first = store
            .advance_invalidation_marker(&matt, TokenPurpose::Reset)
            .await
            .unwrap();
        let second = store
            .advance_invalidation_marker(&matt, TokenPurpose::Reset)
            .await
            .unwrap();
        assert!(first > matt.created_at);
        assert!(second > first);

        let auth = store
            .get_invalidation_marker(&matt, TokenPurpose::Auth)
            .await
            .unwrap();
        assert_eq!(auth, matt.created_at);
    }

    #[test]
    fn test_next_marker_never_moves_backwards() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        assert_eq!(next_marker(future, now), future + Duration::nanoseconds(1));
        assert_eq!(next_marker(now, now), now + Duration::nanoseconds(1));
        assert_eq!(
            next_marker(now - Duration::hours(1), now),
            now + Duration::nanoseconds(1)
        );
    }

    #[tokio::test]
    async fn test_missing_user_errors() {
        let (store, matt) = store_with_matt().await;
        store.delete_user(matt.id).await;
        assert!(matches!(
            store.advance_invalidation_marker(&matt, TokenPurpose::Auth).await,
            Err(WardenError::DoesNotExist(_))
        ));
        assert!(store.set_password(&matt, "x").await.is_err());
        assert!(store.mark_confirmed(&matt, Utc::now()).await.is_err());
        assert!(store.save(matt).await.is_err());
    }

    // ── Updates ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_set_password_and_confirm() {
        let (store, matt) = store_with_matt().await;
        store.set_password(&matt, "plaintext$new").await.unwrap();
        let at = Utc::now();
        store.mark_confirmed(&matt, at).await.unwrap();

        let reloaded = store.find_by_identity(matt.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password, "plaintext$new");
        assert_eq!(reloaded.confirmed_at, Some(at));
    }

    #[tokio::test]
    async fn test_save_keeps_later_markers() {
        let (store, matt) = store_with_matt().await;
        let advanced = store
            .advance_invalidation_marker(&matt, TokenPurpose::Reset)
            .await
            .unwrap();

        // `matt` predates the advance; saving it must not roll the marker back.
        let mut older = matt.clone();
        older.password = "plaintext$changed".to_string();
        older.created_at = matt.created_at - Duration::days(1);
        store.save(older).await.unwrap();

        let reloaded = store.find_by_identity(matt.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password, "plaintext$changed");
        assert_eq!(reloaded.marker(TokenPurpose::Reset), advanced);
        assert_eq!(reloaded.created_at, matt.created_at);

        let mut newer = reloaded.clone();
        let later = advanced + Duration::hours(1);
        newer.markers.insert(TokenPurpose::Reset, later);
        store.save(newer).await.unwrap();
        let reloaded = store.find_by_identity(matt.id).await.unwrap().unwrap();
        assert_eq!(reloaded.marker(TokenPurpose::Reset), later);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let (store, matt) = store_with_matt().await;
        let other = store.clone();
        other.delete_user(matt.id).await;
        assert!(store.is_empty().await);
        assert!(store.all().await.is_empty());
    }
}
