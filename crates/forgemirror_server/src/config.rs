//! Configuration file support for forgemirrord.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `FORGEMIRROR_`, e.g., `FORGEMIRROR_GITHUB_TOKEN`)
//! 3. Config file (~/.config/forgemirror/config.toml or ./forgemirror.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/forgemirror/forgemirror.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/forgemirror/forgemirror.db"  # optional, this is the default
//!
//! [server]
//! bind = "127.0.0.1:8440"
//!
//! [github]
//! token = "ghp_..."               # used by the sync subcommands
//! api_base = "https://github.example.com/api/v3"  # GitHub Enterprise only
//! page_size = 100
//! requests_per_second = 10
//!
//! [webhook]
//! secret = "..."                  # shared secret for delivery signatures
//! callback_url = "https://mirror.example.com/webhooks/github/user-1"
//!
//! [retry]
//! max_attempts = 5                # replay budget for parked webhook events
//! base_delay_secs = 30
//! max_delay_secs = 3600
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use forgemirror::github::{ApiRateLimiter, DEFAULT_RPS, GitHubClient, HostError};
use forgemirror::http::ReqwestTransport;
use forgemirror::pending::RetryPolicy;
use forgemirror::sync::WebhookRegistration;

/// Per-request timeout for clients built against a custom API base.
const CLIENT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Webhook ingestion configuration.
    pub webhook: WebhookConfig,
    /// Replay schedule for parked webhook events.
    pub retry: RetryConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/forgemirror/forgemirror.db` if not specified.
    pub url: Option<String>,
}

/// HTTP server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `serve`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8440".to_string(),
        }
    }
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token used by the sync subcommands. HTTP callers send
    /// their own token as a bearer header instead.
    /// Can also be set via FORGEMIRROR_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
    /// API base URL for GitHub Enterprise deployments. Defaults to the
    /// public GitHub API.
    pub api_base: Option<String>,
    /// Records requested per collection page (GitHub caps this at 100).
    pub page_size: Option<u32>,
    /// Proactive request pacing toward the host.
    pub requests_per_second: Option<u32>,
}

/// Webhook ingestion configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret for verifying delivery signatures.
    /// Can also be set via FORGEMIRROR_WEBHOOK_SECRET environment variable.
    pub secret: Option<String>,
    /// Public URL the host should deliver events to. Full sync registers
    /// repository webhooks against it when both this and `secret` are set.
    pub callback_url: Option<String>,
}

/// Replay schedule for parked webhook events.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts before a parked event is marked failed.
    pub max_attempts: i32,
    /// Delay in seconds before the first replay. Doubles with each failed
    /// attempt.
    pub base_delay_secs: u64,
    /// Ceiling in seconds on the doubling schedule.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 30,
            max_delay_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/forgemirror/config.toml)
    /// 3. Local config file (./forgemirror.toml)
    /// 4. Environment variables with FORGEMIRROR_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        // Add XDG config file if it exists
        if let Some(proj_dirs) = ProjectDirs::from("", "", "forgemirror") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Add local config file (higher priority than XDG)
        let local_config = PathBuf::from("forgemirror.toml");
        if local_config.exists() {
            tracing::debug!("loading config from ./forgemirror.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Add FORGEMIRROR_ prefixed environment variables
        // e.g., FORGEMIRROR_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("FORGEMIRROR")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// If no database URL is configured, defaults to
    /// `sqlite://~/.local/state/forgemirror/forgemirror.db?mode=rwc` on Linux
    /// (using the XDG state directory) or the platform-appropriate equivalent.
    /// The `mode=rwc` parameter creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("forgemirror.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/forgemirror` or
    /// `~/.local/state/forgemirror`. On macOS/Windows, falls back to the
    /// data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "forgemirror").map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }

    /// Replay schedule for parked webhook events.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_secs(self.retry.base_delay_secs),
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }

    /// Webhook registration inputs for full sync, when both the callback
    /// URL and the secret are configured.
    pub fn webhook_registration(&self) -> Option<WebhookRegistration> {
        match (&self.webhook.callback_url, &self.webhook.secret) {
            (Some(callback_url), Some(secret)) => Some(WebhookRegistration {
                callback_url: callback_url.clone(),
                secret: secret.clone(),
            }),
            _ => None,
        }
    }

    /// Build a GitHub client for one token, honoring the configured API
    /// base, page size, and request pacing.
    pub fn build_client(&self, token: &str) -> Result<GitHubClient, HostError> {
        let limiter = Some(ApiRateLimiter::new(
            self.github.requests_per_second.unwrap_or(DEFAULT_RPS),
        ));

        let client = match &self.github.api_base {
            Some(api_base) => {
                let transport =
                    ReqwestTransport::with_timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
                        .map_err(|e| HostError::Transient {
                            message: e.to_string(),
                        })?;
                GitHubClient::new_with_transport(api_base, token, limiter, Arc::new(transport))
            }
            None => GitHubClient::new(token, limiter)?,
        };

        Ok(match self.github.page_size {
            Some(page_size) => client.with_page_size(page_size),
            None => client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert_eq!(config.server.bind, "127.0.0.1:8440");
        assert!(config.github.token.is_none());
        assert!(config.github.api_base.is_none());
        assert!(config.webhook.secret.is_none());
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_secs, 30);
        assert_eq!(config.retry.max_delay_secs, 3600);
    }

    #[test]
    fn test_full_config_parsing() {
        let toml_content = r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [server]
            bind = "0.0.0.0:9000"

            [github]
            token = "ghp_test123"
            api_base = "https://github.example.com/api/v3"
            page_size = 50
            requests_per_second = 4

            [webhook]
            secret = "hook-secret"
            callback_url = "https://mirror.example.com/webhooks/github/user-1"

            [retry]
            max_attempts = 3
            base_delay_secs = 10
            max_delay_secs = 600
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(
            config.database.url,
            Some("sqlite:///tmp/test.db".to_string())
        );
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.github.token, Some("ghp_test123".to_string()));
        assert_eq!(
            config.github.api_base,
            Some("https://github.example.com/api/v3".to_string())
        );
        assert_eq!(config.github.page_size, Some(50));
        assert_eq!(config.github.requests_per_second, Some(4));
        assert_eq!(config.webhook.secret, Some("hook-secret".to_string()));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_config_builder_partial_override() {
        let toml_content = r#"
            [retry]
            max_attempts = 8
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.retry.max_attempts, 8);
        // Other values should be defaults
        assert_eq!(config.retry.base_delay_secs, 30);
        assert_eq!(config.server.bind, "127.0.0.1:8440");
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let config = Config::default();
        let db_url = config.database_url();

        assert!(db_url.is_some());
        let url = db_url.unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("forgemirror.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let toml_content = r#"
            [database]
            url = "postgres://localhost/forgemirror"
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        let db_url = config.database_url();

        assert_eq!(db_url, Some("postgres://localhost/forgemirror".to_string()));
    }

    #[test]
    fn test_retry_policy_conversion() {
        let config = Config {
            retry: RetryConfig {
                max_attempts: 7,
                base_delay_secs: 15,
                max_delay_secs: 900,
            },
            ..Default::default()
        };

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.base_delay, Duration::from_secs(15));
        assert_eq!(policy.max_delay, Duration::from_secs(900));
    }

    #[test]
    fn test_webhook_registration_requires_both_fields() {
        let mut config = Config::default();
        assert!(config.webhook_registration().is_none());

        config.webhook.secret = Some("hook-secret".to_string());
        assert!(config.webhook_registration().is_none());

        config.webhook.callback_url =
            Some("https://mirror.example.com/webhooks/github/user-1".to_string());
        let registration = config.webhook_registration().unwrap();
        assert_eq!(registration.secret, "hook-secret");
        assert_eq!(
            registration.callback_url,
            "https://mirror.example.com/webhooks/github/user-1"
        );
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let toml_content = r#"
            [server]
            bind = "127.0.0.1:8441"
            unknown_field = "should be ignored"
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8441");
    }
}
