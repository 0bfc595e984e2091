//! Identity handling for the bulletin server: the authenticated principal model,
//! the per-request context the gate populates, the resolver contract over the
//! user store, and the login/refresh provider that issues the token pair.
//! Keep the public surface thin and split implementation across sub-modules.

mod gate;
mod principal;
mod provider;
mod request_context;
mod resolver;
mod store;

pub use gate::{AuthGate, GateOutcome};
pub use principal::Principal;
pub use provider::{AuthProvider, LoginRequest, LoginResponse};
pub use request_context::RequestContext;
pub use resolver::PrincipalResolver;
pub use store::UserStore;
