//! API server configuration.

use chrono::Duration;
use keygate_core::auth::jwt::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS, TokenConfig,
    resolve_jwt_secret,
};

/// Client created at startup if it does not exist yet.
#[derive(Clone)]
pub struct BootstrapClient {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for BootstrapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// SQLite connection URL. `None` keeps everything in memory.
    pub database_url: Option<String>,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub bootstrap_client: Option<BootstrapClient>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("bootstrap_client", &self.bootstrap_client)
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                  | Default                           |
    /// |---------------------------|-----------------------------------|
    /// | `BIND_ADDR`               | `127.0.0.1:8000`                  |
    /// | `DATABASE_URL`            | unset (in-memory store)           |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file  |
    /// | `ACCESS_TOKEN_TTL_SECS`   | `300`                             |
    /// | `REFRESH_TOKEN_TTL_SECS`  | `604800`                          |
    /// | `BOOTSTRAP_CLIENT_ID` + `BOOTSTRAP_CLIENT_SECRET` | unset     |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into()),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            jwt_secret: resolve_jwt_secret(),
            access_token_ttl_secs: env_secs("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl_secs: env_secs(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            ),
            bootstrap_client: bootstrap_from_env(),
        }
    }

    /// Config for tests and embedding: in-memory, default lifetimes.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: None,
            jwt_secret: jwt_secret.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            bootstrap_client: None,
        }
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(self.jwt_secret.clone()).with_ttls(
            Duration::seconds(self.access_token_ttl_secs),
            Duration::seconds(self.refresh_token_ttl_secs),
        )
    }
}

fn env_secs(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn bootstrap_from_env() -> Option<BootstrapClient> {
    let client_id = std::env::var("BOOTSTRAP_CLIENT_ID").ok()?;
    let client_secret = std::env::var("BOOTSTRAP_CLIENT_SECRET").ok()?;
    if client_id.is_empty() || client_secret.is_empty() {
        return None;
    }
    Some(BootstrapClient {
        client_id,
        client_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_config_uses_configured_ttls() {
        let mut config = ApiConfig::with_secret("s");
        config.access_token_ttl_secs = 60;
        let tc = config.token_config();
        assert_eq!(tc.access_ttl, Duration::seconds(60));
        assert_eq!(tc.refresh_ttl, Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS));
        assert_eq!(tc.secret, "s");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = ApiConfig::with_secret("top-signing-key");
        config.bootstrap_client = Some(BootstrapClient {
            client_id: "root".into(),
            client_secret: "root-password".into(),
        });
        let printed = format!("{config:?}");
        assert!(!printed.contains("top-signing-key"));
        assert!(!printed.contains("root-password"));
        assert!(printed.contains("root"));
        assert!(printed.contains("<redacted>"));
    }
}
