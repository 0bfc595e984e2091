//!
//! bulletin-auth HTTP server
//! -------------------------
//! Axum frontend over the authentication core.
//!
//! Responsibilities:
//! - Login endpoint issuing the access/refresh token pair.
//! - Refresh endpoint exchanging a live refresh token for a new access token.
//! - The authentication gate mounted as middleware on every route: it
//!   populates the request context when a valid bearer token is present and
//!   otherwise lets the request through unauthenticated.
//! - `/whoami` as the downstream consumer that turns "no principal" into 401;
//!   the gate itself never rejects a request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::config::AuthConfig;
use crate::identity::{AuthGate, AuthProvider, GateOutcome, LoginRequest, RequestContext, UserStore};
use crate::token::{SigningContext, TokenCodec};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate<UserStore>>,
    pub provider: Arc<AuthProvider>,
}

/// Wire the codec, store, gate and provider together from a loaded config.
pub fn build_state(cfg: &AuthConfig, store: Arc<UserStore>) -> anyhow::Result<AppState> {
    let signing = SigningContext::new(&cfg.secret)?;
    let codec = TokenCodec::new(signing);
    let gate = Arc::new(AuthGate::new(codec.clone(), store.clone()));
    let provider = Arc::new(AuthProvider::new(
        codec,
        store,
        cfg.access_validity,
        cfg.refresh_validity,
    ));
    Ok(AppState { gate, provider })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "bulletin-auth ok" }))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(state.clone(), authenticate_request))
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    let cfg = AuthConfig::from_env()?;
    run_with_config(cfg).await
}

pub async fn run_with_config(cfg: AuthConfig) -> anyhow::Result<()> {
    let store = Arc::new(UserStore::new());
    store.ensure_default_admin()?;
    let state = build_state(&cfg, store)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Gate middleware: runs the per-request state machine once and attaches the
/// resulting context as a request extension. Never short-circuits the pipeline.
async fn authenticate_request(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let mut ctx = RequestContext::new(Some(uuid::Uuid::new_v4().to_string()));
    let outcome = state.gate.run(authorization.as_deref(), &mut ctx);
    if let GateOutcome::Rejected(e) = &outcome {
        tracing::debug!(request_id = ?ctx.request_id, code = e.code_str(), "bearer token rejected");
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

#[derive(Debug, Deserialize)]
struct LoginPayload { username: String, password: String }

#[derive(Debug, Deserialize)]
struct RefreshPayload { refresh_token: String }

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> impl IntoResponse {
    let req = LoginRequest { username: payload.username, password: payload.password };
    match state.provider.login(&req) {
        Ok(resp) => (
            StatusCode::OK,
            Json(json!({
                "access_token": resp.access_token,
                "refresh_token": resp.refresh_token,
                "token_type": "Bearer",
            })),
        ),
        Err(e) => {
            let msg = e.to_string();
            if msg == "invalid_credentials" || msg == "account_disabled" {
                (StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"})))
            } else {
                error!("login error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"status":"error","error": msg})))
            }
        }
    }
}

async fn refresh(State(state): State<AppState>, Json(payload): Json<RefreshPayload>) -> impl IntoResponse {
    match state.provider.refresh(&payload.refresh_token) {
        Ok(access_token) => (
            StatusCode::OK,
            Json(json!({"access_token": access_token, "token_type": "Bearer"})),
        ),
        Err(e) => {
            let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({"status":"error","code": e.code_str()})))
        }
    }
}

/// Downstream authorization collaborator: the only place "no principal"
/// becomes an HTTP-level rejection.
async fn whoami(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    match ctx.principal() {
        Some(p) => (StatusCode::OK, Json(json!({
            "username": p.username,
            "authorities": p.authorities,
            "enabled": p.enabled,
        }))),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"}))),
    }
}
