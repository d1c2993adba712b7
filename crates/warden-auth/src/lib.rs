//! # warden-auth
//!
//! Signed, time-limited, single-use tokens and the account flows built on them.
//!
//! This crate provides:
//!
//! - **Tokens** for password reset, email confirmation, and authentication,
//!   bound to a user and a purpose, with expiry windows and scheme rotation (`tokens`)
//! - **Invalidation markers** that retire every outstanding token of a purpose (`store`)
//! - **Account flows** for reset, confirmation, password change, and account creation (`flows`)
//! - **Password hashing** with Argon2 (`hashers`)
//! - **User-facing messages** with per-key overrides (`messages`)
//! - **Token delivery** through a pluggable sender (`notifications`)
//!
//! ## Design Principles
//!
//! All CPU-bound password hashing runs via `tokio::task::spawn_blocking` to
//! avoid blocking the async runtime. All traits are `Send + Sync` so a single
//! [`TokenService`] can be shared across tasks.

pub mod flows;
pub mod hashers;
pub mod messages;
pub mod notifications;
pub mod store;
pub mod tokens;
pub mod user;

// Re-exports for convenience
pub use flows::auth_tokens::AuthTokenCheck;
pub use flows::createable::CreatedUser;
pub use flows::{EmailConfirmation, FlowError, InstructionsSent, Notice, PasswordUpdated};
pub use hashers::{Argon2Hasher, PasswordHasher, PlaintextHasher};
pub use messages::{MessageKey, Messages};
pub use notifications::{LogSender, NotificationSender};
pub use store::{MemoryUserStore, NewUser, UserStore};
pub use tokens::{TokenError, TokenPayload, TokenPolicy, TokenPurpose, TokenService};
pub use user::{UserId, UserRecord};
