//! User fixtures and a ready-wired test service.
//!
//! The fixture accounts all share the password [`PASSWORD`], stored with the
//! [`PlaintextHasher`] so tests stay fast. `tiya@lp.com` is inactive and
//! `jess@lp.com` has no usable password.

use std::sync::Arc;

use chrono::Utc;
use warden_auth::hashers::make_unusable_password;
use warden_auth::{
    MemoryUserStore, NewUser, PasswordHasher, PlaintextHasher, TokenService, UserRecord, UserStore,
};
use warden_core::{Settings, WardenResult};

use crate::outbox::NotificationOutbox;

/// The password of every fixture account that has one.
pub const PASSWORD: &str = "password";

/// One fixture account.
#[derive(Debug, Clone, Copy)]
pub struct FixtureUser {
    /// The account email.
    pub email: &'static str,
    /// Whether the account may sign in.
    pub active: bool,
    /// Whether the account has the password [`PASSWORD`].
    pub has_password: bool,
}

/// The fixture accounts, in creation order.
pub const USERS: [FixtureUser; 7] = [
    FixtureUser { email: "matt@lp.com", active: true, has_password: true },
    FixtureUser { email: "joe@lp.com", active: true, has_password: true },
    FixtureUser { email: "dave@lp.com", active: true, has_password: true },
    FixtureUser { email: "jill@lp.com", active: true, has_password: true },
    FixtureUser { email: "tiya@lp.com", active: false, has_password: true },
    FixtureUser { email: "gene@lp.com", active: true, has_password: true },
    FixtureUser { email: "jess@lp.com", active: true, has_password: false },
];

/// Populates a store with the fixture accounts.
#[derive(Debug, Clone, Copy)]
pub struct UserFixtures {
    confirmed: bool,
}

impl Default for UserFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl UserFixtures {
    /// Fixtures whose accounts are already confirmed.
    pub const fn new() -> Self {
        Self { confirmed: true }
    }

    /// Fixtures whose accounts still need to confirm their email.
    pub const fn unconfirmed() -> Self {
        Self { confirmed: false }
    }

    /// Creates every fixture account in `store` and returns the records.
    pub async fn populate(self, store: &MemoryUserStore) -> WardenResult<Vec<UserRecord>> {
        let password = PlaintextHasher.hash(PASSWORD).await?;
        let mut created = Vec::with_capacity(USERS.len());
        for fixture in USERS {
            let hash = if fixture.has_password {
                password.clone()
            } else {
                make_unusable_password()
            };
            let mut new_user = NewUser::new(fixture.email, hash);
            if !fixture.active {
                new_user = new_user.inactive();
            }
            if self.confirmed {
                new_user = new_user.confirmed(Utc::now());
            }
            created.push(store.create_user(new_user).await?);
        }
        Ok(created)
    }
}

/// A token service wired to a fixture-populated store and a capturing outbox.
pub struct TestApp {
    /// The service under test.
    pub service: TokenService,
    /// The store behind the service.
    pub store: Arc<MemoryUserStore>,
    /// Every token the service delivered.
    pub outbox: NotificationOutbox,
}

impl TestApp {
    /// Builds the app with confirmed fixture accounts.
    ///
    /// # Panics
    ///
    /// Panics if `settings` do not validate.
    pub async fn new(settings: Settings) -> Self {
        Self::with_fixtures(settings, UserFixtures::new()).await
    }

    /// Builds the app with the given fixtures.
    ///
    /// # Panics
    ///
    /// Panics if `settings` do not validate.
    pub async fn with_fixtures(settings: Settings, fixtures: UserFixtures) -> Self {
        let store = Arc::new(MemoryUserStore::new());
        fixtures
            .populate(&store)
            .await
            .expect("fixture accounts are unique");
        let outbox = NotificationOutbox::new();
        let service = TokenService::builder(settings)
            .store(store.clone())
            .hasher(Arc::new(PlaintextHasher))
            .sender(Arc::new(outbox.clone()))
            .build()
            .expect("test settings must validate");
        Self {
            service,
            store,
            outbox,
        }
    }

    /// Returns the current record for `email`.
    ///
    /// # Panics
    ///
    /// Panics if no account uses `email`.
    pub async fn user(&self, email: &str) -> UserRecord {
        self.store
            .find_by_email(email)
            .await
            .expect("memory store does not fail")
            .unwrap_or_else(|| panic!("no fixture account for {email}"))
    }
}
