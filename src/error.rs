//! Authentication error taxonomy and mapping helpers.
//! Every failure the token codec or the gate can produce lives here, along with
//! the HTTP status mapping used by the server frontend. The gate absorbs all of
//! these internally; only the login/refresh paths let them reach a caller.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// Token issuance was asked to sign an empty subject.
    #[error("invalid subject: subject must be a non-empty string")]
    InvalidSubject,

    /// The token text could not be parsed into header/payload/signature.
    #[error("malformed token: {reason}")]
    MalformedToken { reason: String },

    /// Structure parsed but the signature does not verify against the current
    /// signing context. Covers tampering and key mismatch alike.
    #[error("token signature verification failed")]
    SignatureInvalid,

    /// Structurally valid, signature valid, but past the expiry claim.
    #[error("token expired at {expires_at}")]
    ExpiredToken { expires_at: i64 },

    /// Token subject does not match the resolved principal's identity key.
    /// Signals a resolver/codec inconsistency; should not occur in normal operation.
    #[error("subject mismatch: token claims '{claimed}', resolver returned '{resolved}'")]
    SubjectMismatch { claimed: String, resolved: String },

    /// The resolver has no record for the claimed subject.
    #[error("no identity record for '{0}'")]
    IdentityNotFound(String),

    /// Startup configuration problem (missing secret, bad validity). Fatal, never per-request.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        AuthError::MalformedToken { reason: reason.into() }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            AuthError::InvalidSubject => "invalid_subject",
            AuthError::MalformedToken { .. } => "malformed_token",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::ExpiredToken { .. } => "token_expired",
            AuthError::SubjectMismatch { .. } => "subject_mismatch",
            AuthError::IdentityNotFound(_) => "identity_not_found",
            AuthError::Config(_) => "config_error",
        }
    }

    /// Map to HTTP status code for the server frontend.
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::InvalidSubject => 400,
            AuthError::MalformedToken { .. } => 401,
            AuthError::SignatureInvalid => 401,
            AuthError::ExpiredToken { .. } => 401,
            AuthError::SubjectMismatch { .. } => 401,
            AuthError::IdentityNotFound(_) => 401,
            AuthError::Config(_) => 500,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
