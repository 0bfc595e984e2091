//! Login and refresh flows issuing the access/refresh token pair.
//! Both tokens come from the same codec and signing context; they differ only
//! in the expiry offset applied at issuance. No rotation tracking and no
//! revocation list: expiry is the only invalidation mechanism.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::Duration;

use crate::error::{AuthError, AuthResult};
use crate::token::TokenCodec;
use crate::tprintln;

use super::resolver::PrincipalResolver;
use super::store::UserStore;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthProvider {
    codec: TokenCodec,
    store: Arc<UserStore>,
    access_validity: Duration,
    refresh_validity: Duration,
}

impl AuthProvider {
    pub fn new(
        codec: TokenCodec,
        store: Arc<UserStore>,
        access_validity: Duration,
        refresh_validity: Duration,
    ) -> Self {
        Self { codec, store, access_validity, refresh_validity }
    }

    /// Verify credentials and issue the two-token pair.
    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        if !self.store.check_password(&req.username, &req.password) {
            return Err(anyhow!("invalid_credentials"));
        }
        // The resolver's own not-found failure surfaces here; outside the gate
        // it is never absorbed.
        let principal = self.store.resolve(&req.username)?;
        if !principal.enabled {
            return Err(anyhow!("account_disabled"));
        }

        let access_token = self.codec.issue(&principal.username, self.access_validity, BTreeMap::new())?;
        let refresh_token = self.codec.issue(&principal.username, self.refresh_validity, BTreeMap::new())?;
        tprintln!(
            "auth.login user={} access_ttl_secs={} refresh_ttl_secs={}",
            principal.username,
            self.access_validity.num_seconds(),
            self.refresh_validity.num_seconds()
        );
        Ok(LoginResponse { access_token, refresh_token })
    }

    /// Exchange a live refresh token for a fresh access token.
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = self.codec.decode(refresh_token)?;
        if self.codec.is_expired(&claims) {
            return Err(AuthError::ExpiredToken { expires_at: claims.exp });
        }
        let principal = self.store.resolve(&claims.sub)?;
        if principal.username != claims.sub {
            return Err(AuthError::SubjectMismatch {
                claimed: claims.sub.clone(),
                resolved: principal.username.clone(),
            });
        }
        tprintln!("auth.refresh user={}", principal.username);
        self.codec.issue(&principal.username, self.access_validity, BTreeMap::new())
    }
}
