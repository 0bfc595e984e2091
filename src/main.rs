use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var(bulletin_auth::config::ENV_HTTP_PORT).unwrap_or_else(|_| "7878".to_string());
    let access_ttl = std::env::var(bulletin_auth::config::ENV_ACCESS_TTL).unwrap_or_else(|_| "<unset>".to_string());
    let refresh_ttl = std::env::var(bulletin_auth::config::ENV_REFRESH_TTL).unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "bulletin",
        "bulletin-auth starting: RUST_LOG='{}', http_port={}, access_ttl_secs={}, refresh_ttl_secs={}",
        rust_log, http_port, access_ttl, refresh_ttl
    );

    bulletin_auth::server::run().await
}
