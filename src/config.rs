//! Startup configuration for the authentication core.
//! All three signing inputs are required; a missing or out-of-range value is a
//! fatal startup error surfaced through `main`, never a per-request condition.

use anyhow::{Result, bail};
use chrono::Duration;

use crate::token::MIN_SECRET_BYTES;

pub const ENV_SECRET: &str = "BULLETIN_JWT_SECRET";
pub const ENV_ACCESS_TTL: &str = "BULLETIN_ACCESS_TTL_SECS";
pub const ENV_REFRESH_TTL: &str = "BULLETIN_REFRESH_TTL_SECS";
pub const ENV_HTTP_PORT: &str = "BULLETIN_HTTP_PORT";

#[derive(Clone)]
pub struct AuthConfig {
    /// Raw HMAC secret bytes. Held only long enough to build the signing context.
    pub secret: Vec<u8>,
    pub access_validity: Duration,
    pub refresh_validity: Duration,
    pub http_port: u16,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("access_validity", &self.access_validity)
            .field("refresh_validity", &self.refresh_validity)
            .field("http_port", &self.http_port)
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Environment-shaped loader that tests can drive without touching the
    /// process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(secret) = get(ENV_SECRET) else { bail!("{} is required", ENV_SECRET) };
        let secret = secret.into_bytes();
        if secret.len() < MIN_SECRET_BYTES {
            bail!("{} must be at least {} bytes", ENV_SECRET, MIN_SECRET_BYTES);
        }

        let access_validity = required_ttl(&get, ENV_ACCESS_TTL)?;
        let refresh_validity = required_ttl(&get, ENV_REFRESH_TTL)?;

        let http_port = match get(ENV_HTTP_PORT) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(p) => p,
                Err(_) => bail!("{} is not a valid port: {}", ENV_HTTP_PORT, raw),
            },
            None => 7878,
        };

        Ok(Self { secret, access_validity, refresh_validity, http_port })
    }
}

fn required_ttl(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Duration> {
    let Some(raw) = get(name) else { bail!("{} is required", name) };
    let secs: i64 = match raw.parse() {
        Ok(s) => s,
        Err(_) => bail!("{} is not a valid number of seconds: {}", name, raw),
    };
    if secs <= 0 {
        bail!("{} must be positive, got {}", name, secs);
    }
    Ok(Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + 'static {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn full_config_parses() {
        let cfg = AuthConfig::from_lookup(lookup(&[
            (ENV_SECRET, "0123456789abcdef0123456789abcdef"),
            (ENV_ACCESS_TTL, "900"),
            (ENV_REFRESH_TTL, "604800"),
            (ENV_HTTP_PORT, "9090"),
        ]))
        .unwrap();
        assert_eq!(cfg.access_validity, Duration::seconds(900));
        assert_eq!(cfg.refresh_validity, Duration::seconds(604_800));
        assert_eq!(cfg.http_port, 9090);
    }

    #[test]
    fn port_defaults_when_absent() {
        let cfg = AuthConfig::from_lookup(lookup(&[
            (ENV_SECRET, "0123456789abcdef0123456789abcdef"),
            (ENV_ACCESS_TTL, "900"),
            (ENV_REFRESH_TTL, "604800"),
        ]))
        .unwrap();
        assert_eq!(cfg.http_port, 7878);
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = AuthConfig::from_lookup(lookup(&[
            (ENV_ACCESS_TTL, "900"),
            (ENV_REFRESH_TTL, "604800"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_SECRET));
    }

    #[test]
    fn short_secret_is_fatal() {
        let err = AuthConfig::from_lookup(lookup(&[
            (ENV_SECRET, "short"),
            (ENV_ACCESS_TTL, "900"),
            (ENV_REFRESH_TTL, "604800"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[test]
    fn non_positive_validity_is_fatal() {
        for bad in ["0", "-60"] {
            let err = AuthConfig::from_lookup(lookup(&[
                (ENV_SECRET, "0123456789abcdef0123456789abcdef"),
                (ENV_ACCESS_TTL, bad),
                (ENV_REFRESH_TTL, "604800"),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("positive"), "ttl {} accepted", bad);
        }
    }

    #[test]
    fn debug_never_prints_the_secret() {
        let cfg = AuthConfig::from_lookup(lookup(&[
            (ENV_SECRET, "0123456789abcdef0123456789abcdef"),
            (ENV_ACCESS_TTL, "900"),
            (ENV_REFRESH_TTL, "604800"),
        ]))
        .unwrap();
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("0123456789abcdef"));
    }
}
