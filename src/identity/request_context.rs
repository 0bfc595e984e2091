use super::Principal;

/// Per-request state carrying zero-or-one authenticated principal.
/// Created empty at request start, set at most once by the gate, read by
/// downstream authorization, discarded at request end.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<Principal>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: Option<String>) -> Self {
        Self { principal: None, request_id }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Attach the authenticated principal. Returns false and leaves the
    /// context untouched if a principal is already present.
    pub fn authenticate(&mut self, principal: Principal) -> bool {
        if self.principal.is_some() {
            return false;
        }
        self.principal = Some(principal);
        true
    }
}
