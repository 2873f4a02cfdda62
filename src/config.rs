use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Default configuration constants
const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";
const DEFAULT_AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";
const DEFAULT_SCOPES: &str =
    "channels:read,groups:read,search:read,users:read,channels:history,groups:history";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_IDLE_PER_HOST: i32 = 10;
const DEFAULT_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;
const DEFAULT_UTC_OFFSET: &str = "+00:00";

/// Path of the OAuth entry point, relative to `auth_server.public_url`.
pub const LOGIN_PATH: &str = "/auth/slack/login";
pub const CALLBACK_PATH: &str = "/auth/slack/callback";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub slack: SlackConfig,
    pub store: StoreConfig,
    pub auth_server: AuthServerConfig,
    pub connection: ConnectionConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    pub api_base_url: String,
    pub authorize_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthServerConfig {
    pub bind_address: String,
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub timeout_seconds: u64,
    pub max_idle_per_host: i32,
    pub pool_idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub utc_offset: String,
}

impl Config {
    pub fn load(config_path: Option<&str>, data_path: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Default values
        settings = settings
            .set_default("slack.api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("slack.authorize_url", DEFAULT_AUTHORIZE_URL)?
            .set_default("slack.scopes", DEFAULT_SCOPES)?
            .set_default("store.database_path", format!("{}/tokens.db", data_path))?
            .set_default("auth_server.bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("auth_server.public_url", DEFAULT_PUBLIC_URL)?
            .set_default("connection.timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .set_default("connection.max_idle_per_host", DEFAULT_MAX_IDLE_PER_HOST)?
            .set_default(
                "connection.pool_idle_timeout_seconds",
                DEFAULT_POOL_IDLE_TIMEOUT_SECONDS,
            )?
            .set_default("display.utc_offset", DEFAULT_UTC_OFFSET)?;

        // Load from config file if provided
        if let Some(path) = config_path
            && Path::new(path).exists()
        {
            settings = settings.add_source(config::File::with_name(path));
        }

        // Override with environment variables
        settings = settings.add_source(
            config::Environment::with_prefix("MCP_SLACK")
                .prefix_separator("_")
                .separator("__"),
        );

        // OAuth app credentials keep their conventional variable names
        for (var, key) in [
            ("SLACK_CLIENT_ID", "slack.client_id"),
            ("SLACK_CLIENT_SECRET", "slack.client_secret"),
            ("SLACK_AUTH_URI", "slack.redirect_uri"),
        ] {
            if let Ok(value) = std::env::var(var) {
                settings = settings.set_override(key, Some(value))?;
            }
        }

        let config: Config = settings.build()?.try_deserialize()?;
        config.utc_offset()?;
        Ok(config)
    }

    /// Where users are sent to (re-)authorize a workspace.
    pub fn auth_url(&self) -> String {
        format!(
            "{}{}",
            self.auth_server.public_url.trim_end_matches('/'),
            LOGIN_PATH
        )
    }

    /// Redirect URI registered with the Slack app, falling back to our own callback.
    pub fn redirect_uri(&self) -> String {
        self.slack.redirect_uri.clone().unwrap_or_else(|| {
            format!(
                "{}{}",
                self.auth_server.public_url.trim_end_matches('/'),
                CALLBACK_PATH
            )
        })
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        self.display
            .utc_offset
            .parse::<FixedOffset>()
            .with_context(|| format!("Invalid display.utc_offset '{}'", self.display.utc_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            for var in [
                "SLACK_CLIENT_ID",
                "SLACK_CLIENT_SECRET",
                "SLACK_AUTH_URI",
                "MCP_SLACK_AUTH_SERVER__PUBLIC_URL",
                "MCP_SLACK_DISPLAY__UTC_OFFSET",
            ] {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        let config = Config::load(None, "/tmp/broker-test").unwrap();

        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
        assert_eq!(config.store.database_path, "/tmp/broker-test/tokens.db");
        assert_eq!(config.auth_server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.connection.timeout_seconds, 30);
        assert!(config.slack.client_id.is_none());
        assert!(config.slack.scopes.contains("search:read"));
    }

    #[test]
    #[serial]
    fn test_auth_url_and_default_redirect() {
        clear_env();
        let config = Config::load(None, "/tmp/broker-test").unwrap();

        assert_eq!(config.auth_url(), "http://localhost:3000/auth/slack/login");
        assert_eq!(
            config.redirect_uri(),
            "http://localhost:3000/auth/slack/callback"
        );
    }

    #[test]
    #[serial]
    fn test_oauth_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("SLACK_CLIENT_ID", "123.456");
            std::env::set_var("SLACK_AUTH_URI", "https://broker.example.com/cb");
            std::env::set_var("MCP_SLACK_AUTH_SERVER__PUBLIC_URL", "https://broker.example.com/");
        }

        let config = Config::load(None, "/tmp/broker-test").unwrap();
        clear_env();

        assert_eq!(config.slack.client_id.as_deref(), Some("123.456"));
        assert_eq!(config.redirect_uri(), "https://broker.example.com/cb");
        assert_eq!(
            config.auth_url(),
            "https://broker.example.com/auth/slack/login"
        );
    }

    #[test]
    #[serial]
    fn test_invalid_utc_offset_is_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("MCP_SLACK_DISPLAY__UTC_OFFSET", "not-an-offset");
        }

        let result = Config::load(None, "/tmp/broker-test");
        clear_env();

        assert!(result.is_err());
    }
}
