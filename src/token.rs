//! Token codec: issue and verify the signed, self-contained bearer artifact.
//!
//! Tokens are standard compact three-segment base64url (header.payload.signature)
//! signed with HMAC-SHA-256, so anything already holding a token issued by the
//! previous implementation keeps working. Timestamps are whole seconds since the
//! Unix epoch (JWT NumericDate); expiry equality counts as expired.
//!
//! Decoding verifies structure and signature only. Expiry is a separate, explicit
//! check so callers can tell "badly formed" apart from "expired".

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// HS256 floor: a secret shorter than the 256-bit hash output weakens the MAC.
pub const MIN_SECRET_BYTES: usize = 32;

/// Scalar extension claim values. Kept closed so the wire format stays
/// deterministic; verification never consumes these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ClaimValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Claim set carried in the token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Identity key of the authenticated subject.
    pub sub: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds. Strictly after `iat` for every issued token.
    pub exp: i64,
    /// Extension claims, reserved for future authority embedding.
    #[serde(flatten)]
    pub extra: BTreeMap<String, ClaimValue>,
}

/// Process-wide signing capability: the HMAC secret and the prepared keys.
/// Loaded once at startup and never mutated. Deliberately carries no Serialize
/// impl, and Debug redacts the material so it cannot leak through logs.
#[derive(Clone)]
pub struct SigningContext {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningContext(<redacted>)")
    }
}

impl SigningContext {
    pub fn new(secret: &[u8]) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::Config(format!(
                "signing secret must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }
}

/// Stateless encoder/decoder over a shared [`SigningContext`]. Safe to clone and
/// share across arbitrarily many concurrent requests.
#[derive(Clone)]
pub struct TokenCodec {
    signing: SigningContext,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(signing: SigningContext) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked explicitly via is_expired, not during decode.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self { signing, validation }
    }

    /// Issue a signed token for `subject` valid for `validity` from now.
    pub fn issue(
        &self,
        subject: &str,
        validity: Duration,
        extra: BTreeMap<String, ClaimValue>,
    ) -> AuthResult<String> {
        if subject.is_empty() {
            return Err(AuthError::InvalidSubject);
        }
        let iat = Utc::now().timestamp();
        let claims = Claims { sub: subject.to_string(), iat, exp: iat + validity.num_seconds(), extra };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.signing.encoding)
            .map_err(|e| AuthError::Config(format!("token signing failed: {e}")))
    }

    /// Parse and verify the signature of `token`, returning its claims.
    /// Does not reject expired tokens.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.signing.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                _ => AuthError::malformed(e.to_string()),
            })
    }

    /// True iff the claims are at or past expiry as of now. Uses the same Utc
    /// clock as issuance, so there is no skew within one process.
    pub fn is_expired(&self, claims: &Claims) -> bool {
        Self::is_expired_at(claims, Utc::now())
    }

    /// Pure form of the expiry check; `exp == at` counts as expired.
    pub fn is_expired_at(claims: &Claims, at: DateTime<Utc>) -> bool {
        claims.exp <= at.timestamp()
    }
}
