//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;

use chrono::Duration;
use todo_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_TOKEN_TTL_HOURS};
use todo_shared::token::TokenSigner;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `PORT` (binds `0.0.0.0:<PORT>`)
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Document store location: an SQLite file path, or `:memory:`.
    /// Env: `DATABASE_URL`
    /// Default: `./todo.db`
    pub database_url: String,

    /// The single origin allowed by CORS.
    /// Env: `CLIENT_APP_URL`
    /// Default: unset (any origin).
    pub client_app_url: Option<String>,

    /// Secret the token signing key is derived from.
    /// Env: `TOKEN_SECRET`
    /// Default: unset (random key per process; tokens die on restart).
    pub token_secret: Option<String>,

    /// Session token lifetime in hours.
    /// Env: `TOKEN_TTL_HOURS`
    /// Default: 720 (30 days)
    pub token_ttl_hours: i64,

    /// Require a valid bearer token on task routes and check that the caller
    /// owns the task.
    /// Env: `REQUIRE_AUTH` (true/false)
    /// Default: `false`
    pub require_auth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_url: "./todo.db".to_string(),
            client_app_url: None,
            token_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            require_auth: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => {
                    tracing::warn!(value = %port, "Invalid PORT, using default");
                }
            }
        }

        if let Some(url) = lookup("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database_url = url;
            }
        }

        if let Some(origin) = lookup("CLIENT_APP_URL") {
            let origin = origin.trim().trim_end_matches('/');
            if !origin.is_empty() {
                config.client_app_url = Some(origin.to_string());
            }
        }

        if let Some(secret) = lookup("TOKEN_SECRET") {
            if !secret.is_empty() {
                config.token_secret = Some(secret);
            }
        }

        if let Some(val) = lookup("TOKEN_TTL_HOURS") {
            match val.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => config.token_ttl_hours = hours,
                _ => {
                    tracing::warn!(value = %val, "Invalid TOKEN_TTL_HOURS, using default");
                }
            }
        }

        if let Some(val) = lookup("REQUIRE_AUTH") {
            match val.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => config.require_auth = true,
                "false" | "0" | "no" | "off" | "" => config.require_auth = false,
                _ => {
                    tracing::warn!(value = %val, "Invalid REQUIRE_AUTH, using default");
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Build the token signer described by this configuration.
    pub fn token_signer(&self) -> TokenSigner {
        let ttl = Duration::hours(self.token_ttl_hours);
        match &self.token_secret {
            Some(secret) => TokenSigner::from_secret(secret.as_bytes(), ttl),
            None => {
                tracing::warn!(
                    "TOKEN_SECRET not set, using a random signing key (sessions end on restart)"
                );
                TokenSigner::generate(ttl)
            }
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_url", &self.database_url)
            .field("client_app_url", &self.client_app_url)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("require_auth", &self.require_auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5000).into());
        assert_eq!(config.database_url, "./todo.db");
        assert!(config.client_app_url.is_none());
        assert!(!config.require_auth);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("PORT", "8081"),
            ("DATABASE_URL", ":memory:"),
            ("CLIENT_APP_URL", "http://localhost:5173/"),
            ("TOKEN_TTL_HOURS", "2"),
            ("REQUIRE_AUTH", "true"),
        ]);
        assert_eq!(config.http_addr.port(), 8081);
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.client_app_url.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.token_ttl_hours, 2);
        assert!(config.require_auth);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("TOKEN_TTL_HOURS", "-5")]);
        assert_eq!(config.http_addr.port(), 5000);
        assert_eq!(config.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
    }

    #[test]
    fn test_require_auth_flag_spellings() {
        for on in ["true", "TRUE", " Yes ", "1", "on"] {
            assert!(config_from(&[("REQUIRE_AUTH", on)]).require_auth, "{on}");
        }
        for off in ["false", "False", "0", "no", "", "maybe"] {
            assert!(!config_from(&[("REQUIRE_AUTH", off)]).require_auth, "{off}");
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = config_from(&[("TOKEN_SECRET", "hunter2")]);
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_secret_signer_is_stable() {
        let config = config_from(&[("TOKEN_SECRET", "s3cret")]);
        let token = config.token_signer().issue(todo_shared::UserId::new());
        assert!(config.token_signer().verify(&token).is_ok());
    }
}
