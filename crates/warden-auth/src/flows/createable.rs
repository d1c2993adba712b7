//! Accounts created on a user's behalf.
//!
//! An administrator (or an import job) creates the account with a random
//! password. The new user receives a reset token and picks their own.

use warden_core::error::WardenError;

use super::{user_event, FlowError};
use crate::hashers::generate_default_password;
use crate::store::NewUser;
use crate::tokens::{TokenPurpose, TokenService};
use crate::user::UserRecord;

/// A newly created account.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    /// The stored record.
    pub user: UserRecord,
    /// The reset token sent to the new user.
    pub reset_token: String,
}

impl TokenService {
    /// Creates an account for `email` and sends it a reset token.
    ///
    /// Fails with [`FlowError::EmailAlreadyAssociated`] if an account already
    /// uses the email, ignoring ASCII case.
    pub async fn create_user(&self, email: &str) -> Result<CreatedUser, FlowError> {
        let email = email.trim();
        let already_taken = || FlowError::EmailAlreadyAssociated {
            email: email.to_string(),
        };
        if self.store.find_by_email(email).await?.is_some() {
            return Err(already_taken());
        }

        let password = self.hasher.hash(&generate_default_password()).await?;
        let user = match self.store.create_user(NewUser::new(email, password)).await {
            Ok(user) => user,
            Err(WardenError::Conflict(_)) => return Err(already_taken()),
            Err(e) => return Err(e.into()),
        };

        let reset_token = self
            .issue(&user, TokenPurpose::Reset)
            .await
            .map_err(|e| FlowError::token(TokenPurpose::Reset, e))?;
        self.signals.user_created.send(&user_event(&user));
        self.sender
            .send(TokenPurpose::Reset, &user, &reset_token)
            .await?;
        tracing::info!(user_id = user.id, "Created user");

        Ok(CreatedUser { user, reset_token })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use warden_core::Settings;
    use warden_signals::UserEvent;

    use super::FlowError;
    use crate::hashers::PlaintextHasher;
    use crate::store::{MemoryUserStore, NewUser, UserStore};
    use crate::tokens::TokenService;

    async fn setup() -> (TokenService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        store
            .create_user(NewUser::new("matt@lp.com", "plaintext$password"))
            .await
            .unwrap();
        let settings = Settings {
            secret_key: "secret".to_string(),
            ..Settings::default()
        };
        let service = TokenService::builder(settings)
            .store(store.clone())
            .hasher(Arc::new(PlaintextHasher))
            .build()
            .unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_create_user_sends_reset_token() {
        let (service, store) = setup().await;
        let created_count = Arc::new(AtomicUsize::new(0));
        let c = created_count.clone();
        service.signals().user_created.connect(
            "count",
            Arc::new(move |_: &UserEvent| {
                c.fetch_add(1, Ordering::SeqCst);
                None
            }),
        );

        let created = service.create_user("dude@lp.com").await.unwrap();
        assert_eq!(created.user.email, "dude@lp.com");
        assert!(store.find_by_email("dude@lp.com").await.unwrap().is_some());
        assert_eq!(created_count.load(Ordering::SeqCst), 1);

        let updated = service
            .reset_password(&created.reset_token, "chosen")
            .await
            .unwrap();
        assert_eq!(updated.user.password, "plaintext$chosen");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let (service, _) = setup().await;
        let err = service.create_user("Matt@LP.com").await.unwrap_err();
        assert!(matches!(err, FlowError::EmailAlreadyAssociated { .. }));
        assert_eq!(
            err.user_message(service.messages()).unwrap(),
            "Matt@LP.com is already associated with an account."
        );
    }
}
