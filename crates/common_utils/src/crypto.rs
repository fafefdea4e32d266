//! Utilities for cryptographic algorithms

use base64::Engine;
use error_stack::{report, ResultExt};
use masking::{PeekInterface, Secret};
use ring::{digest, hmac};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    consts,
    errors::{CryptoError, CustomResult},
};

const BASE64_ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Trait for cryptographically signing messages
pub trait SignMessage {
    /// Takes in a secret and a message and returns the calculated signature as bytes
    fn sign_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Trait for cryptographically verifying a message against a signature
pub trait VerifySignature {
    /// Takes in a secret, the signature and the message and verifies the message
    /// against the signature
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, CryptoError>;
}

/// Trait for generating a message digest
pub trait GenerateDigest {
    /// Computes the digest of the given message
    fn generate_digest(&self, msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Represents the HMAC-SHA-256 algorithm
#[derive(Debug)]
pub struct HmacSha256;

impl SignMessage for HmacSha256 {
    fn sign_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, CryptoError> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        Ok(hmac::sign(&key, msg).as_ref().to_vec())
    }
}

impl VerifySignature for HmacSha256 {
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, CryptoError> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);

        Ok(hmac::verify(&key, msg, signature).is_ok())
    }
}

/// Represents the SHA-256 digest algorithm
#[derive(Debug)]
pub struct Sha256;

impl GenerateDigest for Sha256 {
    fn generate_digest(&self, msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        Ok(digest::digest(&digest::SHA256, msg).as_ref().to_vec())
    }
}

/// A symmetric, timestamped seal for small payloads that must round-trip
/// through an untrusted party (e.g. card data carried across a 3-D Secure
/// interstitial).
///
/// Wire format: `base64url(json) "." unix-timestamp "." base64url(hmac)`
/// where the HMAC-SHA-256 covers the first two segments. Envelopes older
/// than `max_age` are rejected on `unseal`; the default is 15 minutes.
pub struct SignedEnvelope {
    secret: Secret<String>,
    max_age_secs: i64,
}

impl SignedEnvelope {
    /// Create an envelope signer with the default maximum age.
    pub fn new(secret: Secret<String>) -> Self {
        Self {
            secret,
            max_age_secs: consts::SIGNED_ENVELOPE_MAX_AGE_SECS,
        }
    }

    /// Override the maximum accepted envelope age.
    pub fn with_max_age(secret: Secret<String>, max_age_secs: i64) -> Self {
        Self {
            secret,
            max_age_secs,
        }
    }

    /// Serialize and sign `value`, stamping it with the current time.
    pub fn seal<T: Serialize>(&self, value: &T) -> CustomResult<String, CryptoError> {
        self.seal_at(value, crate::date_time::now_unix_timestamp())
    }

    /// Verify, age-check and deserialize a sealed value.
    pub fn unseal<T: DeserializeOwned>(&self, sealed: &str) -> CustomResult<T, CryptoError> {
        let (payload, timestamp, signature) = match sealed.split('.').collect::<Vec<_>>()[..] {
            [payload, timestamp, signature] => (payload, timestamp, signature),
            _ => return Err(report!(CryptoError::DecodingFailed))
                .attach_printable("sealed token does not have three segments"),
        };

        let message = format!("{payload}.{timestamp}");
        let signature = BASE64_ENGINE
            .decode(signature)
            .change_context(CryptoError::DecodingFailed)?;
        if !HmacSha256.verify_signature(
            self.secret.peek().as_bytes(),
            &signature,
            message.as_bytes(),
        )? {
            return Err(report!(CryptoError::SignatureVerificationFailed));
        }

        let sealed_at: i64 = timestamp
            .parse::<i64>()
            .change_context(CryptoError::DecodingFailed)?;
        let age = crate::date_time::now_unix_timestamp() - sealed_at;
        if age > self.max_age_secs {
            return Err(report!(CryptoError::EnvelopeExpired));
        }

        let payload = BASE64_ENGINE
            .decode(payload)
            .change_context(CryptoError::DecodingFailed)?;
        serde_json::from_slice(&payload).change_context(CryptoError::DecodingFailed)
    }

    fn seal_at<T: Serialize>(
        &self,
        value: &T,
        timestamp: i64,
    ) -> CustomResult<String, CryptoError> {
        let payload = serde_json::to_vec(value).change_context(CryptoError::EncodingFailed)?;
        let payload = BASE64_ENGINE.encode(payload);
        let message = format!("{payload}.{timestamp}");
        let signature =
            HmacSha256.sign_message(self.secret.peek().as_bytes(), message.as_bytes())?;
        Ok(format!("{message}.{}", BASE64_ENGINE.encode(signature)))
    }
}
