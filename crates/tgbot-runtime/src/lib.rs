//! # tgbot Runtime
//!
//! Update delivery engines plus the ambient pieces a bot process needs.
//!
//! | Module | Provides |
//! |--------|----------|
//! | [`polling`] | [`Poller`]: `getUpdates` fetch loop feeding a worker pool |
//! | [`webhook`] | [`WebhookServer`]: axum endpoint registered with `setWebhook` |
//! | [`config`] | [`BotConfig`] loaded by figment from files and `TGBOT_*` |
//! | [`logging`] | [`LoggingBuilder`] over `tracing-subscriber` |
//! | [`signal`] | [`shutdown_signal`] for Ctrl+C / SIGTERM |
//!
//! Both engines run the same composed middleware chain (default
//! `[recover()]`), share the [`EngineState`] lifecycle and can only be started
//! once.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tgbot_runtime::{Poller, load_config, logging, shutdown_signal};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let poller = Poller::new(bot, config.polling);
//! poller.run_until(shutdown_signal()).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod polling;
pub mod signal;
pub mod state;
pub mod webhook;

pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, PollingConfig, WebhookConfig,
    load_config, load_config_from_file, validate_config,
};
pub use error::{PollError, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use polling::{ErrorHook, Poller};
pub use signal::shutdown_signal;
pub use state::EngineState;
pub use webhook::{SECRET_TOKEN_HEADER, WebhookServer};

// Re-export logging crates for convenience
pub use tracing;
pub use tracing_subscriber;
