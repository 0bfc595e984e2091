//! Per-request authentication gate: turns a raw Authorization header into a
//! validated principal on the request context, or leaves the request
//! unauthenticated for downstream policy to deal with.
//!
//! The gate never aborts a request. Every failure terminates in an
//! unauthenticated pass-through; the outcome enum is the only signal that
//! crosses the gate boundary.

use std::sync::Arc;

use crate::error::AuthError;
use crate::token::TokenCodec;
use crate::tprintln;

use super::request_context::RequestContext;
use super::resolver::PrincipalResolver;

const BEARER_PREFIX: &str = "Bearer ";

/// Terminal state of one gate run.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Context already carried a principal; nothing re-derived, resolver not queried.
    AlreadyAuthenticated,
    /// No Authorization header, or not the bearer scheme.
    NoHeader,
    /// Token present but rejected; the request proceeds unauthenticated.
    Rejected(AuthError),
    /// Principal attached to the context.
    Authenticated,
}

pub struct AuthGate<R: PrincipalResolver> {
    codec: TokenCodec,
    resolver: Arc<R>,
}

impl<R: PrincipalResolver> AuthGate<R> {
    pub fn new(codec: TokenCodec, resolver: Arc<R>) -> Self {
        Self { codec, resolver }
    }

    /// Run the per-request state machine exactly once. Mutates only `ctx`,
    /// holds no lock, retries nothing: a rejected attempt is final for this
    /// request.
    pub fn run(&self, authorization: Option<&str>, ctx: &mut RequestContext) -> GateOutcome {
        if ctx.is_authenticated() {
            return GateOutcome::AlreadyAuthenticated;
        }

        let Some(header) = authorization else { return GateOutcome::NoHeader };
        // Empty bearer text falls through to decode, which reports it malformed.
        let Some(token) = header.strip_prefix(BEARER_PREFIX) else {
            return GateOutcome::NoHeader;
        };

        let claims = match self.codec.decode(token) {
            Ok(c) => c,
            Err(e) => {
                tprintln!("gate.reject request={:?} stage=decode err={}", ctx.request_id, e);
                return GateOutcome::Rejected(e);
            }
        };

        let principal = match self.resolver.resolve(&claims.sub) {
            Ok(p) => p,
            Err(e) => {
                // "user missing" is deferred, not a hard failure here.
                tprintln!("gate.reject request={:?} stage=resolve err={}", ctx.request_id, e);
                return GateOutcome::Rejected(e);
            }
        };

        if principal.username != claims.sub {
            let e = AuthError::SubjectMismatch {
                claimed: claims.sub.clone(),
                resolved: principal.username.clone(),
            };
            tprintln!("gate.reject request={:?} stage=cross_validate err={}", ctx.request_id, e);
            return GateOutcome::Rejected(e);
        }
        if self.codec.is_expired(&claims) {
            let e = AuthError::ExpiredToken { expires_at: claims.exp };
            tprintln!("gate.reject request={:?} stage=cross_validate err={}", ctx.request_id, e);
            return GateOutcome::Rejected(e);
        }

        ctx.authenticate(principal);
        GateOutcome::Authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthResult;
    use crate::identity::Principal;
    use crate::token::SigningContext;
    use chrono::Duration;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub resolver with a single known user and a call counter.
    struct OneUser {
        username: String,
        calls: AtomicUsize,
    }

    impl PrincipalResolver for OneUser {
        fn resolve(&self, username: &str) -> AuthResult<Principal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if username == self.username {
                Ok(Principal::new(username, ["ROLE_USER"]))
            } else {
                Err(AuthError::IdentityNotFound(username.to_string()))
            }
        }
    }

    fn gate_for(username: &str) -> (AuthGate<OneUser>, TokenCodec, Arc<OneUser>) {
        let codec = TokenCodec::new(
            SigningContext::new(b"0123456789abcdef0123456789abcdef").unwrap(),
        );
        let resolver = Arc::new(OneUser { username: username.to_string(), calls: AtomicUsize::new(0) });
        (AuthGate::new(codec.clone(), resolver.clone()), codec, resolver)
    }

    #[test]
    fn no_header_passes_through_unauthenticated() {
        let (gate, _, resolver) = gate_for("alice");
        let mut ctx = RequestContext::default();
        assert_eq!(gate.run(None, &mut ctx), GateOutcome::NoHeader);
        assert!(!ctx.is_authenticated());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_bearer_scheme_is_treated_as_no_header() {
        let (gate, _, _) = gate_for("alice");
        let mut ctx = RequestContext::default();
        assert_eq!(gate.run(Some("Basic YWxpY2U6cHc="), &mut ctx), GateOutcome::NoHeader);
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn empty_bearer_text_rejects_as_malformed() {
        let (gate, _, _) = gate_for("alice");
        let mut ctx = RequestContext::default();
        match gate.run(Some("Bearer "), &mut ctx) {
            GateOutcome::Rejected(e) => assert_eq!(e.code_str(), "malformed_token"),
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn valid_token_authenticates_context() {
        let (gate, codec, _) = gate_for("alice");
        let token = codec.issue("alice", Duration::hours(1), BTreeMap::new()).unwrap();
        let mut ctx = RequestContext::default();
        assert_eq!(gate.run(Some(&format!("Bearer {}", token)), &mut ctx), GateOutcome::Authenticated);
        let p = ctx.principal().unwrap();
        assert_eq!(p.username, "alice");
        assert!(p.has_authority("ROLE_USER"));
    }

    #[test]
    fn unknown_subject_is_absorbed_not_raised() {
        let (gate, codec, _) = gate_for("alice");
        let token = codec.issue("ghost", Duration::hours(1), BTreeMap::new()).unwrap();
        let mut ctx = RequestContext::default();
        match gate.run(Some(&format!("Bearer {}", token)), &mut ctx) {
            GateOutcome::Rejected(AuthError::IdentityNotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected IdentityNotFound rejection, got {:?}", other),
        }
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn expired_token_rejects_without_raising() {
        let (gate, codec, _) = gate_for("alice");
        let token = codec.issue("alice", Duration::seconds(0), BTreeMap::new()).unwrap();
        let mut ctx = RequestContext::default();
        match gate.run(Some(&format!("Bearer {}", token)), &mut ctx) {
            GateOutcome::Rejected(AuthError::ExpiredToken { .. }) => {}
            other => panic!("expected ExpiredToken rejection, got {:?}", other),
        }
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn second_run_on_authenticated_context_skips_resolver() {
        let (gate, codec, resolver) = gate_for("alice");
        let token = codec.issue("alice", Duration::hours(1), BTreeMap::new()).unwrap();
        let header = format!("Bearer {}", token);
        let mut ctx = RequestContext::default();
        assert_eq!(gate.run(Some(&header), &mut ctx), GateOutcome::Authenticated);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.run(Some(&header), &mut ctx), GateOutcome::AlreadyAuthenticated);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tampered_token_rejects_with_signature_error() {
        let (gate, codec, _) = gate_for("alice");
        let token = codec.issue("alice", Duration::hours(1), BTreeMap::new()).unwrap();
        // Splice in the signature of a token for a different subject.
        let other = codec.issue("mallory", Duration::hours(1), BTreeMap::new()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_sig = other.rsplit('.').next().unwrap();
        let forged = format!("{}.{}.{}", parts[0], parts[1], other_sig);
        let mut ctx = RequestContext::default();
        match gate.run(Some(&format!("Bearer {}", forged)), &mut ctx) {
            GateOutcome::Rejected(AuthError::SignatureInvalid) => {}
            other => panic!("expected signature rejection, got {:?}", other),
        }
        assert!(!ctx.is_authenticated());
    }
}
