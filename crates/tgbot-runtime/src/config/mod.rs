//! Configuration for the delivery engines.
//!
//! Loaded with figment from built-in defaults, `tgbot.toml` and `TGBOT_*`
//! environment variables, then checked with [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, PollingConfig, SpanEventConfig,
    WebhookConfig,
};
pub use validation::{validate_config, validate_polling, validate_token, validate_webhook};
