use crate::error::AuthResult;

use super::Principal;

/// Contract the authentication core requires from the identity store: given an
/// identity key, return the current principal or report not-found. Must be a
/// pure read with no side effects on the stored identity. The core makes no
/// assumption about storage or caching; a blocking implementation keeps its own
/// timeout semantics.
///
/// Inside the gate a miss is absorbed into an unauthenticated pass-through.
/// Invoked directly (login, refresh), [`crate::error::AuthError::IdentityNotFound`]
/// surfaces to the caller.
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, username: &str) -> AuthResult<Principal>;
}
