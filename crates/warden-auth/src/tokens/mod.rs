//! Signed, time-limited tokens.
//!
//! - [`TokenPurpose`]: reset, confirm, or auth
//! - [`TokenPayload`]: identity, purpose, and issuance time
//! - [`TokenSerializer`]: per-purpose encoding and signature checks
//! - [`TokenPolicy`]: expiry, identity binding, and invalidation markers
//! - [`TokenService`]: the facade used by the account flows
//!
//! A token has three `.`-separated, URL-safe segments: the base64url JSON
//! claims, the base62 issuance time in nanoseconds, and the base64url MAC.

mod error;
mod payload;
mod policy;
mod purpose;
mod serializer;
mod service;

pub use error::TokenError;
pub use payload::TokenPayload;
pub use policy::{Resolved, TokenPolicy};
pub use purpose::TokenPurpose;
pub use serializer::{Decoded, TokenSerializer, Verified};
pub use service::{TokenService, TokenServiceBuilder};
