//! # warden-test
//!
//! Testing utilities for warden. Provides a capturing notification outbox,
//! a settings builder with test-friendly defaults, and user fixtures wired to
//! an in-memory store.

pub mod fixtures;
pub mod outbox;
pub mod override_settings;

pub use fixtures::{TestApp, UserFixtures, PASSWORD};
pub use outbox::{Notification, NotificationOutbox};
pub use override_settings::SettingsOverride;
