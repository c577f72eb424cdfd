//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tgbot_core::DEFAULT_API_URL;

/// Root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token issued by the platform.
    #[serde(default)]
    pub token: String,

    /// Endpoint template with `{token}` and `{method}` placeholders.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Long-polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            polling: PollingConfig::default(),
            webhook: WebhookConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("api_url", &self.api_url)
            .field("polling", &self.polling)
            .field("webhook", &self.webhook)
            .field("logging", &self.logging)
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

// =============================================================================
// Polling
// =============================================================================

/// Long-polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Maximum updates per `getUpdates` call (1-100).
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Seconds the server may hold each long poll open.
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,

    /// Update kinds to receive; empty means the server default.
    #[serde(default)]
    pub allowed_updates: Vec<String>,

    /// Number of handler workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds running handlers get to finish after stop before they are aborted.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl PollingConfig {
    /// Bound on waiting for running handlers after stop.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            timeout_secs: default_poll_timeout(),
            allowed_updates: Vec::new(),
            workers: default_workers(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_limit() -> u32 {
    100
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_workers() -> usize {
    1
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook server configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Socket address to bind to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path of the endpoint.
    #[serde(default = "default_path")]
    pub path: String,

    /// Externally reachable base URL; the registered URL is this plus `path`.
    #[serde(default)]
    pub public_url: String,

    /// Public key certificate to upload when registering.
    #[serde(default)]
    pub certificate: Option<PathBuf>,

    /// Fixed IP address the platform should send pushes to.
    #[serde(default)]
    pub ip_address: Option<String>,

    /// Maximum simultaneous push connections (1-100).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Update kinds to receive; empty means the server default.
    #[serde(default)]
    pub allowed_updates: Vec<String>,

    /// Drop updates queued before registration.
    #[serde(default)]
    pub drop_pending_updates: bool,

    /// Secret expected in the `X-Telegram-Bot-Api-Secret-Token` header.
    #[serde(default)]
    pub secret_token: Option<String>,

    /// Seconds to wait for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl WebhookConfig {
    /// The URL registered with the platform.
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), self.path)
    }

    /// Graceful shutdown bound.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            public_url: String::new(),
            certificate: None,
            ip_address: None,
            max_connections: default_max_connections(),
            allowed_updates: Vec::new(),
            drop_pending_updates: false,
            secret_token: None,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("listen", &self.listen)
            .field("path", &self.path)
            .field("public_url", &self.public_url)
            .field("certificate", &self.certificate)
            .field("ip_address", &self.ip_address)
            .field("max_connections", &self.max_connections)
            .field("allowed_updates", &self.allowed_updates)
            .field("drop_pending_updates", &self.drop_pending_updates)
            .field("secret_token", &self.secret_token.as_ref().map(|_| "<redacted>"))
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .finish()
    }
}

fn default_listen() -> String {
    "0.0.0.0:80".to_string()
}

fn default_path() -> String {
    "/webhook".to_string()
}

fn default_max_connections() -> u32 {
    tgbot_methods::DEFAULT_MAX_CONNECTIONS
}

fn default_shutdown_timeout() -> u64 {
    5
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file, used when `output` is `file`.
    pub file_path: Option<PathBuf>,
    pub span_events: SpanEventConfig,
    pub thread_ids: bool,
    /// Include file names and line numbers.
    pub file_location: bool,
    /// Per-target levels, e.g. `tgbot_runtime = "debug"`.
    pub filters: BTreeMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.api_url, "https://api.telegram.org/bot{token}/{method}");
        assert_eq!(config.polling.limit, 100);
        assert_eq!(config.polling.timeout_secs, 30);
        assert_eq!(config.polling.workers, 1);
        assert_eq!(config.polling.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.webhook.listen, "0.0.0.0:80");
        assert_eq!(config.webhook.path, "/webhook");
        assert_eq!(config.webhook.max_connections, 40);
        assert_eq!(config.webhook.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_webhook_url_joins_path() {
        let config = WebhookConfig {
            public_url: "https://bot.example.com/".into(),
            ..Default::default()
        };
        assert_eq!(config.webhook_url(), "https://bot.example.com/webhook");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = BotConfig {
            token: "123:SECRET".into(),
            webhook: WebhookConfig {
                secret_token: Some("hunter2".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("hunter2"));
    }
}
