//! # warden-core
//!
//! Core types, settings, signing, and error types for warden.
//! This crate has no dependency on the rest of the workspace and provides the
//! foundation for the token, signal, and test crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Security settings consumed by the token service
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`signing`] - Keyed signatures, timestamped signing, and the URL-safe serializer
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Validity windows and small crypto helpers

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod signing;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{WardenError, WardenResult};
pub use settings::{SecuritySettings, Settings};
pub use utils::within::Within;
