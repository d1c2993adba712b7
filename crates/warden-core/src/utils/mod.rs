//! Utility types and functions for warden.
//!
//! This module provides:
//! - [`within`]: human-readable validity windows such as `"5 days"`.
//! - [`crypto`]: constant-time comparison and random URL-safe strings.

pub mod crypto;
pub mod within;
