//! # warden
//!
//! Signed, time-limited, single-use tokens for password reset, email
//! confirmation, and authentication.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `warden` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use warden::auth::{MemoryUserStore, TokenPurpose, TokenService};
//! use warden::core::Settings;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings {
//!     secret_key: "change-me".to_string(),
//!     ..Settings::default()
//! };
//! let service = TokenService::builder(settings)
//!     .store(Arc::new(MemoryUserStore::new()))
//!     .build()?;
//! let token = service.send_reset_password_instructions("joe@lp.com").await?.token;
//! let resolved = service.resolve(&token, TokenPurpose::Reset).await?;
//! # let _ = resolved;
//! # Ok(())
//! # }
//! ```

/// Settings, signing, logging, and error types.
pub use warden_core as core;

/// Tokens, user store, password hashing, and account flows.
#[cfg(feature = "auth")]
pub use warden_auth as auth;

/// Signals fired by the account flows.
#[cfg(feature = "signals")]
pub use warden_signals as signals;

/// Outbox, settings builder, and fixtures for tests.
#[cfg(feature = "testing")]
pub use warden_test as test;

// Third-party crates used in public signatures.
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;
