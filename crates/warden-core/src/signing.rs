//! Cryptographic signing for warden.
//!
//! This module provides tools for signing and verifying strings, attaching
//! timestamps, and serializing small payloads into compact URL-safe tokens.
//!
//! ## Overview
//!
//! - [`Signer`]: Signs and verifies strings with HMAC over an ordered list of
//!   [`SigningKey`]s.
//! - [`TimestampSigner`]: Extends [`Signer`] with an issuance timestamp for expiration.
//! - [`UrlSafeSerializer`]: JSON-encodes a payload, base64-encodes it, and signs it
//!   with a timestamp, producing `payload.timestamp.signature`.
//!
//! ## Key Rotation
//!
//! A [`Signer`] always signs with its first key. When verifying, the first key
//! is tried, then every remaining key in order; the first match wins and the
//! result reports whether a non-current key was used, so callers can re-sign
//! ("upgrade on use").

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;

use crate::error::{WardenError, WardenResult};
use crate::settings::{SignatureAlgorithm, Settings};
use crate::utils::crypto::constant_time_eq;

/// The separator used between value, timestamp, and signature.
///
/// It is not part of the base64url or base62 alphabets and needs no escaping
/// in a URL path segment.
const DEFAULT_SEP: char = '.';

/// Default salt for a bare [`Signer`].
const SIGNER_SALT: &str = "warden.signing.Signer";

// ============================================================
// Errors
// ============================================================

/// Failures of signature verification and token decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The input does not have the shape of a signed value.
    #[error("Malformed signed value: {0}")]
    Malformed(String),

    /// The value decodes but no configured key produced its signature.
    #[error("Signature does not match")]
    SignatureMismatch,

    /// The signature is valid but older than the allowed age.
    ///
    /// `value` is the authenticated value with the timestamp removed, so the
    /// caller can still tell whose token expired.
    #[error("Signature age {age} exceeds {max_age}")]
    Expired {
        /// The authenticated value.
        value: String,
        /// When the value was signed.
        signed_at: DateTime<Utc>,
        /// How old the signature was when checked.
        age: Duration,
        /// The allowed age.
        max_age: Duration,
    },

    /// The payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ============================================================
// SigningKey
// ============================================================

/// One generation of signing material: secret, salt, and algorithm.
#[derive(Debug, Clone)]
pub struct SigningKey {
    name: String,
    secret: String,
    salt: String,
    algorithm: SignatureAlgorithm,
}

impl SigningKey {
    /// Creates a key with the given secret, the default salt, and HMAC-SHA256.
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            salt: SIGNER_SALT.to_string(),
            algorithm: SignatureAlgorithm::HmacSha256,
        }
    }

    /// Sets the salt.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    /// Sets the MAC algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The label of this key, as configured.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Computes the base64url signature of `value` under this key.
    fn signature(&self, value: &str) -> String {
        let salted_key = format!("{}:{}", self.salt, self.secret);
        let mac = match self.algorithm {
            SignatureAlgorithm::HmacSha256 => {
                compute_mac::<Hmac<Sha256>>(salted_key.as_bytes(), value.as_bytes())
            }
            SignatureAlgorithm::HmacSha384 => {
                compute_mac::<Hmac<Sha384>>(salted_key.as_bytes(), value.as_bytes())
            }
            SignatureAlgorithm::HmacSha512 => {
                compute_mac::<Hmac<Sha512>>(salted_key.as_bytes(), value.as_bytes())
            }
        };
        URL_SAFE_NO_PAD.encode(mac)
    }
}

fn compute_mac<M: Mac + KeyInit>(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(value);
    mac.finalize().into_bytes().to_vec()
}

// ============================================================
// Signer
// ============================================================

/// The result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsigned {
    /// The original value.
    pub value: String,
    /// The name of the key that verified the signature.
    pub key_name: String,
    /// Whether a key other than the current one matched.
    pub legacy: bool,
}

/// Signs and verifies strings using HMAC.
///
/// # Examples
///
/// ```
/// use warden_core::signing::Signer;
///
/// let signer = Signer::new("my-secret-key");
/// let signed = signer.sign("hello");
/// assert_eq!(signer.unsign(&signed).unwrap().value, "hello");
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    keys: Vec<SigningKey>,
    sep: char,
}

impl Signer {
    /// Creates a new `Signer` with a single key built from `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self::from_key(SigningKey::new("default", secret))
    }

    /// Creates a `Signer` whose current key is `key`.
    pub fn from_key(key: SigningKey) -> Self {
        Self {
            keys: vec![key],
            sep: DEFAULT_SEP,
        }
    }

    /// Builds the signer for one purpose from the configured schemes.
    ///
    /// Schemes in `signing_schemes` come first (the first one signs), followed
    /// by `deprecated_signing_schemes`. A scheme without its own salt uses
    /// `purpose_salt`; a scheme without its own secret uses `secret_key`.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::ImproperlyConfigured`] if no scheme is configured.
    pub fn from_settings(settings: &Settings, purpose_salt: &str) -> WardenResult<Self> {
        let security = &settings.security;
        let keys: Vec<SigningKey> = security
            .signing_schemes
            .iter()
            .chain(&security.deprecated_signing_schemes)
            .map(|scheme| {
                SigningKey::new(scheme.name.clone(), settings.scheme_secret(scheme))
                    .with_salt(scheme.salt.as_deref().unwrap_or(purpose_salt))
                    .with_algorithm(scheme.algorithm)
            })
            .collect();

        if keys.is_empty() {
            return Err(WardenError::ImproperlyConfigured(
                "At least one signing scheme is required".to_string(),
            ));
        }

        Ok(Self {
            keys,
            sep: DEFAULT_SEP,
        })
    }

    /// Appends fallback keys, tried in order after the existing ones.
    #[must_use]
    pub fn with_fallback_keys(mut self, keys: Vec<SigningKey>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// Sets the salt on every key.
    #[must_use]
    pub fn with_salt(mut self, salt: &str) -> Self {
        for key in &mut self.keys {
            key.salt = salt.to_string();
        }
        self
    }

    /// Sets the separator character between value and signature.
    #[must_use]
    pub const fn with_sep(mut self, sep: char) -> Self {
        self.sep = sep;
        self
    }

    /// The separator character.
    pub const fn sep(&self) -> char {
        self.sep
    }

    /// The name of the key used for signing.
    pub fn current_key_name(&self) -> &str {
        self.keys.first().map_or("", SigningKey::name)
    }

    /// Computes the signature of `value` under the current key.
    pub fn signature(&self, value: &str) -> String {
        self.keys.first().map(|key| key.signature(value)).unwrap_or_default()
    }

    /// Checks `signature` against every key in order.
    ///
    /// Returns the index of the first matching key (0 is the current key),
    /// or `None` if no key produced it.
    pub fn verify(&self, value: &str, signature: &str) -> Option<usize> {
        self.keys.iter().position(|key| {
            constant_time_eq(signature.as_bytes(), key.signature(value).as_bytes())
        })
    }

    /// Signs a value with the current key, returning `"value<sep>signature"`.
    pub fn sign(&self, value: &str) -> String {
        format!("{value}{}{}", self.sep, self.signature(value))
    }

    /// Verifies and returns the original value from a signed string.
    ///
    /// Tries the current key first, then each fallback key.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Malformed`] if there is no separator or the
    /// signature is not base64url, and [`SigningError::SignatureMismatch`] if
    /// no key matches.
    pub fn unsign(&self, signed_value: &str) -> Result<Unsigned, SigningError> {
        let (value, sig) = signed_value
            .rsplit_once(self.sep)
            .ok_or_else(|| SigningError::Malformed("No separator found in signed value".to_string()))?;

        if sig.is_empty() || !sig.bytes().all(is_urlsafe_b64_byte) {
            return Err(SigningError::Malformed(
                "Signature is not URL-safe base64".to_string(),
            ));
        }

        let index = self
            .verify(value, sig)
            .ok_or(SigningError::SignatureMismatch)?;
        Ok(Unsigned {
            value: value.to_string(),
            key_name: self.keys[index].name.clone(),
            legacy: index > 0,
        })
    }
}

// ============================================================
// TimestampSigner
// ============================================================

/// The result of a successful timestamped verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampUnsigned {
    /// The original value.
    pub value: String,
    /// When the value was signed.
    pub signed_at: DateTime<Utc>,
    /// The name of the key that verified the signature.
    pub key_name: String,
    /// Whether a key other than the current one matched.
    pub legacy: bool,
}

/// Signs and verifies strings with embedded timestamps.
///
/// Timestamps have nanosecond resolution and are base62-encoded.
///
/// # Examples
///
/// ```
/// use warden_core::signing::TimestampSigner;
///
/// let signer = TimestampSigner::new("my-secret-key");
/// let signed = signer.sign("hello");
/// assert_eq!(signer.unsign(&signed, None).unwrap().value, "hello");
/// ```
#[derive(Debug, Clone)]
pub struct TimestampSigner {
    signer: Signer,
}

impl TimestampSigner {
    /// Creates a new `TimestampSigner` with a single key built from `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            signer: Signer::new(secret).with_salt("warden.signing.TimestampSigner"),
        }
    }

    /// Wraps an existing [`Signer`], keeping its keys and salts.
    pub const fn from_signer(signer: Signer) -> Self {
        Self { signer }
    }

    /// The wrapped signer.
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Signs a value with the current time.
    ///
    /// Format: `"value.timestamp.signature"`.
    pub fn sign(&self, value: &str) -> String {
        self.sign_at(value, Utc::now())
    }

    /// Signs a value with an explicit timestamp.
    ///
    /// Times outside the nanosecond-representable range encode as the epoch,
    /// which any finite window rejects.
    pub fn sign_at(&self, value: &str, timestamp: DateTime<Utc>) -> String {
        let nanos = timestamp
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or_default();
        let value_with_ts = format!("{value}{}{}", self.signer.sep, base62_encode(nanos));
        self.signer.sign(&value_with_ts)
    }

    /// Verifies a timestamp-signed string against the current time.
    ///
    /// If `max_age` is `Some`, the signature is rejected when it is older than
    /// the given duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is invalid, the format is wrong,
    /// or the timestamp has expired.
    pub fn unsign(
        &self,
        signed_value: &str,
        max_age: Option<Duration>,
    ) -> Result<TimestampUnsigned, SigningError> {
        self.unsign_at(signed_value, max_age, Utc::now())
    }

    /// Verifies a timestamp-signed string as of `now`.
    ///
    /// # Errors
    ///
    /// See [`unsign`](Self::unsign).
    pub fn unsign_at(
        &self,
        signed_value: &str,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<TimestampUnsigned, SigningError> {
        let unsigned = self.signer.unsign(signed_value)?;

        // Split off the timestamp (last segment)
        let (value, timestamp_str) = unsigned
            .value
            .rsplit_once(self.signer.sep)
            .ok_or_else(|| SigningError::Malformed("No timestamp found in signed value".to_string()))?;

        let signed_at = base62_decode(timestamp_str)
            .ok()
            .and_then(|n| i64::try_from(n).ok())
            .map(DateTime::from_timestamp_nanos)
            .ok_or_else(|| SigningError::Malformed("Invalid timestamp encoding".to_string()))?;

        if let Some(max_age) = max_age {
            let age = now.signed_duration_since(signed_at);
            if age > max_age {
                return Err(SigningError::Expired {
                    value: value.to_string(),
                    signed_at,
                    age,
                    max_age,
                });
            }
        }

        Ok(TimestampUnsigned {
            value: value.to_string(),
            signed_at,
            key_name: unsigned.key_name,
            legacy: unsigned.legacy,
        })
    }
}

// ============================================================
// UrlSafeSerializer
// ============================================================

/// A payload recovered by [`UrlSafeSerializer::loads`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    /// The decoded payload.
    pub payload: T,
    /// When the token was issued.
    pub signed_at: DateTime<Utc>,
    /// The name of the key that verified the signature.
    pub key_name: String,
    /// Whether a key other than the current one matched.
    pub legacy: bool,
}

/// Serializes payloads into signed, timestamped, URL-safe tokens.
///
/// The token has exactly three `.`-separated segments:
/// base64url(JSON payload), base62(issuance time in ns), base64url(MAC).
///
/// # Examples
///
/// ```
/// use warden_core::signing::UrlSafeSerializer;
/// use serde_json::json;
///
/// let serializer = UrlSafeSerializer::new("secret");
/// let token = serializer.dumps(&json!({"id": 42})).unwrap();
/// let loaded = serializer.loads::<serde_json::Value>(&token, None).unwrap();
/// assert_eq!(loaded.payload, json!({"id": 42}));
/// ```
#[derive(Debug, Clone)]
pub struct UrlSafeSerializer {
    signer: TimestampSigner,
}

impl UrlSafeSerializer {
    /// Creates a serializer with a single key built from `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            signer: TimestampSigner::from_signer(
                Signer::new(secret).with_salt("warden.signing.UrlSafeSerializer"),
            ),
        }
    }

    /// Creates a serializer around an existing signer.
    pub const fn from_signer(signer: Signer) -> Self {
        Self {
            signer: TimestampSigner::from_signer(signer),
        }
    }

    /// The wrapped timestamp signer.
    pub const fn timestamp_signer(&self) -> &TimestampSigner {
        &self.signer
    }

    /// Serializes and signs a payload with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Serialization`] if the payload cannot be encoded as JSON.
    pub fn dumps<T: Serialize>(&self, payload: &T) -> Result<String, SigningError> {
        self.dumps_at(payload, Utc::now())
    }

    /// Serializes and signs a payload with an explicit issuance time.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Serialization`] if the payload cannot be encoded as JSON.
    pub fn dumps_at<T: Serialize>(
        &self,
        payload: &T,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SigningError> {
        let json_bytes = serde_json::to_vec(payload)
            .map_err(|e| SigningError::Serialization(format!("Failed to serialize payload: {e}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(json_bytes);
        Ok(self.signer.sign_at(&encoded, issued_at))
    }

    /// Verifies and deserializes a token against the current time.
    ///
    /// # Errors
    ///
    /// - [`SigningError::Malformed`] if the token does not have exactly three
    ///   segments of the expected alphabets, or the payload does not decode.
    /// - [`SigningError::SignatureMismatch`] if no key verifies it.
    /// - [`SigningError::Expired`] if it is older than `max_age`.
    pub fn loads<T: DeserializeOwned>(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Loaded<T>, SigningError> {
        self.loads_at(token, max_age, Utc::now())
    }

    /// Verifies and deserializes a token as of `now`.
    ///
    /// # Errors
    ///
    /// See [`loads`](Self::loads).
    pub fn loads_at<T: DeserializeOwned>(
        &self,
        token: &str,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Loaded<T>, SigningError> {
        self.check_shape(token)?;
        let unsigned = self.signer.unsign_at(token, max_age, now)?;
        Ok(Loaded {
            payload: Self::decode_payload(&unsigned.value)?,
            signed_at: unsigned.signed_at,
            key_name: unsigned.key_name,
            legacy: unsigned.legacy,
        })
    }

    /// Decodes an already-authenticated payload segment.
    ///
    /// Used on the `value` carried by [`SigningError::Expired`].
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Malformed`] if the segment is not base64url JSON of type `T`.
    pub fn decode_payload<T: DeserializeOwned>(segment: &str) -> Result<T, SigningError> {
        let raw = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| SigningError::Malformed(format!("Base64 decode failed: {e}")))?;
        serde_json::from_slice(&raw)
            .map_err(|e| SigningError::Malformed(format!("JSON deserialization failed: {e}")))
    }

    /// Rejects anything that is not three non-empty segments of URL-safe characters.
    fn check_shape(&self, token: &str) -> Result<(), SigningError> {
        let sep = self.signer.signer().sep();
        let segments: Vec<&str> = token.split(sep).collect();
        if segments.len() != 3 {
            return Err(SigningError::Malformed(format!(
                "Expected 3 segments, found {}",
                segments.len()
            )));
        }
        if segments
            .iter()
            .any(|s| s.is_empty() || !s.bytes().all(is_urlsafe_b64_byte))
        {
            return Err(SigningError::Malformed(
                "Token contains characters outside the URL-safe alphabet".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// Helpers
// ============================================================

const fn is_urlsafe_b64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Base62 character set (digits + uppercase + lowercase).
const BASE62_CHARS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encodes a u64 into a base62 string.
fn base62_encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut chars = Vec::new();
    while n > 0 {
        // `n % 62` is always a valid index into the 62-byte table.
        #[allow(clippy::cast_possible_truncation)]
        let digit = (n % 62) as usize;
        chars.push(char::from(BASE62_CHARS[digit]));
        n /= 62;
    }
    chars.iter().rev().collect()
}

/// Decodes a base62 string into a u64.
fn base62_decode(s: &str) -> Result<u64, SigningError> {
    if s.is_empty() {
        return Err(SigningError::Malformed("Empty base62 value".to_string()));
    }
    let mut result: u64 = 0;
    for c in s.bytes() {
        let digit = match c {
            b'0'..=b'9' => u64::from(c - b'0'),
            b'A'..=b'Z' => u64::from(c - b'A') + 10,
            b'a'..=b'z' => u64::from(c - b'a') + 36,
            _ => {
                return Err(SigningError::Malformed(format!(
                    "Invalid base62 character: {c}"
                )));
            }
        };
        result = result
            .checked_mul(62)
            .and_then(|r| r.checked_add(digit))
            .ok_or_else(|| SigningError::Malformed("Base62 overflow".to_string()))?;
    }
    Ok(result)
}
