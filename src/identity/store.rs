//! In-memory user store backing the principal resolver contract.
//! Passwords are stored as Argon2 PHC strings; lookups are pure reads.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};

use crate::error::{AuthError, AuthResult};
use crate::tprintln;

use super::principal::Principal;
use super::resolver::PrincipalResolver;

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[derive(Debug, Clone)]
struct UserRecord {
    password_hash: String,
    authorities: BTreeSet<String>,
    enabled: bool,
}

/// Process-local user registry. Writes happen through explicit admin-style
/// calls; the resolver path never mutates.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserStore {
    pub fn new() -> Self { Self::default() }

    /// Add or replace a user. Any existing record for the username is dropped.
    pub fn add_user<S: Into<String>>(
        &self,
        username: &str,
        password: &str,
        authorities: impl IntoIterator<Item = S>,
    ) -> Result<()> {
        let record = UserRecord {
            password_hash: hash_password(password)?,
            authorities: authorities.into_iter().map(Into::into).collect(),
            enabled: true,
        };
        self.users.write().insert(username.to_string(), record);
        Ok(())
    }

    pub fn remove_user(&self, username: &str) -> bool {
        self.users.write().remove(username).is_some()
    }

    pub fn set_enabled(&self, username: &str, enabled: bool) -> bool {
        match self.users.write().get_mut(username) {
            Some(rec) => { rec.enabled = enabled; true }
            None => false,
        }
    }

    /// Verify a password attempt for `username`. Unknown users fail like wrong
    /// passwords so the caller cannot probe which usernames exist.
    pub fn check_password(&self, username: &str, password: &str) -> bool {
        let hash = match self.users.read().get(username) {
            Some(rec) => rec.password_hash.clone(),
            None => return false,
        };
        verify_password(&hash, password)
    }

    /// Seed a default admin on an empty store so a fresh deployment is usable.
    pub fn ensure_default_admin(&self) -> Result<()> {
        if !self.users.read().is_empty() { return Ok(()); }
        self.add_user("admin", "admin", ["ROLE_ADMIN", "ROLE_USER"])?;
        tprintln!("store.seed default admin created");
        Ok(())
    }
}

impl PrincipalResolver for UserStore {
    fn resolve(&self, username: &str) -> AuthResult<Principal> {
        let users = self.users.read();
        let rec = users
            .get(username)
            .ok_or_else(|| AuthError::IdentityNotFound(username.to_string()))?;
        Ok(Principal {
            username: username.to_string(),
            authorities: rec.authorities.clone(),
            enabled: rec.enabled,
        })
    }
}
