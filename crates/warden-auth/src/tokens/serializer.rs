//! Per-purpose token serialization.
//!
//! A [`TokenSerializer`] holds one [`UrlSafeSerializer`] per purpose, each
//! salted with that purpose's salt and carrying the full chain of signing
//! schemes (current first, then deprecated).

use chrono::{DateTime, Duration, Utc};
use warden_core::error::WardenResult;
use warden_core::settings::Settings;
use warden_core::signing::{Signer, SigningError, UrlSafeSerializer};

use super::payload::{Claims, TokenPayload};
use super::{TokenError, TokenPurpose};

/// A token whose signature verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// The decoded payload.
    pub payload: TokenPayload,
    /// The signing scheme that matched.
    pub scheme: String,
    /// Whether a deprecated scheme matched.
    pub legacy: bool,
}

/// The outcome of decoding an authentic token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Within its window.
    Fresh(Verified),
    /// Authentic but older than its window.
    Expired(TokenPayload),
}

/// Encodes and decodes tokens for every purpose.
#[derive(Debug, Clone)]
pub struct TokenSerializer {
    reset: UrlSafeSerializer,
    confirm: UrlSafeSerializer,
    auth: UrlSafeSerializer,
}

impl TokenSerializer {
    /// Builds the serializers from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no signing scheme is configured.
    pub fn from_settings(settings: &Settings) -> WardenResult<Self> {
        let build = |purpose: TokenPurpose| -> WardenResult<UrlSafeSerializer> {
            let signer = Signer::from_settings(settings, purpose.salt(&settings.security))?;
            Ok(UrlSafeSerializer::from_signer(signer))
        };
        Ok(Self {
            reset: build(TokenPurpose::Reset)?,
            confirm: build(TokenPurpose::Confirm)?,
            auth: build(TokenPurpose::Auth)?,
        })
    }

    const fn for_purpose(&self, purpose: TokenPurpose) -> &UrlSafeSerializer {
        match purpose {
            TokenPurpose::Reset => &self.reset,
            TokenPurpose::Confirm => &self.confirm,
            TokenPurpose::Auth => &self.auth,
        }
    }

    /// Encodes and signs `payload` with its own issuance time.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Store`] if the payload cannot be serialized.
    pub fn dumps(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        self.for_purpose(payload.purpose)
            .dumps_at(&payload.claims(), payload.issued_at)
            .map_err(TokenError::from_signing)
    }

    /// Verifies and decodes a token for `purpose` as of `now`.
    ///
    /// An expired token is still decoded so the caller can find its owner.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Malformed`] if the token does not decode.
    /// - [`TokenError::SignatureMismatch`] if no scheme verifies it, or it
    ///   was issued for a different purpose.
    pub fn loads(
        &self,
        token: &str,
        purpose: TokenPurpose,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Decoded, TokenError> {
        match self
            .for_purpose(purpose)
            .loads_at::<Claims>(token, max_age, now)
        {
            Ok(loaded) => {
                let payload = TokenPayload::from_claims(loaded.payload, loaded.signed_at);
                check_purpose(&payload, purpose)?;
                Ok(Decoded::Fresh(Verified {
                    payload,
                    scheme: loaded.key_name,
                    legacy: loaded.legacy,
                }))
            }
            Err(SigningError::Expired {
                value, signed_at, ..
            }) => {
                let claims: Claims =
                    UrlSafeSerializer::decode_payload(&value).map_err(TokenError::from_signing)?;
                let payload = TokenPayload::from_claims(claims, signed_at);
                check_purpose(&payload, purpose)?;
                Ok(Decoded::Expired(payload))
            }
            Err(e) => Err(TokenError::from_signing(e)),
        }
    }
}

/// Salts normally separate purposes; a scheme with its own salt does not, so
/// the signed purpose tag is checked as well.
fn check_purpose(payload: &TokenPayload, purpose: TokenPurpose) -> Result<(), TokenError> {
    if payload.purpose == purpose {
        Ok(())
    } else {
        tracing::warn!(
            expected = %purpose,
            found = %payload.purpose,
            "Token presented for the wrong purpose"
        );
        Err(TokenError::SignatureMismatch)
    }
}
