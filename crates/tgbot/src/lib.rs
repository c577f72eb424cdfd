//! # tgbot
//!
//! An async client for the Telegram Bot API.
//!
//! ## Architecture
//!
//! ```text
//!             ┌───────────────┐        ┌───────────────┐
//!  platform ─▶│    Poller     │   or   │ WebhookServer │◀─ platform
//!             └───────┬───────┘        └───────┬───────┘
//!                     └──────────┬─────────────┘
//!                                ▼
//!                     middleware ─▶ Bot::handle_update(Context)
//!                                │
//!                                ▼  follow-up calls
//!                     RequestBody ─▶ execute ─▶ HttpTransport
//! ```
//!
//! - **Core** ([`core`]): request execution, updates, [`Bot`](prelude::Bot), middleware
//! - **Methods** ([`methods`]): request bodies such as [`SendMessage`](prelude::SendMessage)
//! - **Transport** ([`transport`]): the reqwest-backed HTTP client
//! - **Runtime** ([`runtime`]): polling and webhook engines, config, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tgbot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     init_logging(&config.logging);
//!
//!     let client = tgbot::client(&config.token)?;
//!     let bot = Arc::new(from_fn(client, |ctx: Arc<Context>| async move {
//!         if let (Some(chat), Some(text)) = (ctx.update().chat_id(), ctx.update().text()) {
//!             ctx.send(&SendMessage::new(chat, text)).await?;
//!         }
//!         Ok(())
//!     }));
//!
//!     Poller::new(bot, config.polling)
//!         .run_until(shutdown_signal())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): load `tgbot.toml`
//! - `json-log`: JSON log format
//! - `test-util`: `MockTransport` for tests

pub use tgbot_core as core;
pub use tgbot_methods as methods;
pub use tgbot_runtime as runtime;
pub use tgbot_transport as transport;

use tgbot_core::{ApiClient, TransportResult};

/// Builds an [`ApiClient`] for `token` with the default reqwest transport.
pub fn client(token: impl Into<String>) -> TransportResult<ApiClient> {
    Ok(ApiClient::new(token, tgbot_transport::default_transport()?))
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tgbot::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Bot and handler chain
    pub use tgbot_core::{
        ApiClient, ApiError, Bot, BoxError, Context, Middleware, Next, Update, UpdateType,
        async_trait, from_fn, recover, trace,
    };

    // Request bodies
    pub use tgbot_core::RequestBody;
    pub use tgbot_methods::{
        DeleteWebhook, GetMe, GetUpdates, GetWebhookInfo, InputFile, ParseMode, SendMessage,
        SetWebhook, WebhookInfo,
    };

    // Engines, configuration and logging
    pub use tgbot_runtime::logging::init_from_config as init_logging;
    pub use tgbot_runtime::{
        BotConfig, ConfigLoader, EngineState, Poller, WebhookServer, load_config,
        load_config_from_file, shutdown_signal,
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tgbot_core::testing::MockTransport;
    use tokio_test::assert_ok;

    use super::prelude::*;

    #[test]
    fn test_client_uses_default_endpoint() {
        let client = assert_ok!(super::client("123:abc"));
        assert_eq!(client.token(), "123:abc");
        assert_eq!(
            client.api_url().format("123:abc", "getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
    }

    #[tokio::test]
    async fn test_prelude_is_enough_for_a_reply() {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(json!({
            "message_id": 2,
            "date": 0,
            "chat": {"id": 7, "type": "private"},
            "text": "hi"
        }));
        let client = ApiClient::new("123:abc", transport.clone());

        let update: Update = serde_json::from_value(json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "date": 0,
                "chat": {"id": 7, "type": "private"},
                "text": "hi"
            }
        }))
        .unwrap();
        let ctx = Context::new(client, update);

        let chat = ctx.update().chat_id().unwrap();
        let text = ctx.update().text().unwrap().to_string();
        assert_ok!(ctx.send(&SendMessage::new(chat, text).reply_to(1)).await);

        let body = transport.request_json(0);
        assert_eq!(body["chat_id"], 7);
        assert_eq!(body["reply_to_message_id"], 1);
        assert!(transport.requests()[0].url.ends_with("/sendMessage"));
    }
}
