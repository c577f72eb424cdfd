//! Echo Bot
//!
//! Replies to every text message with the same text.
//!
//! # Commands
//!
//! - `/ping` replies "Pong!"
//! - `/me` replies with the bot's own username (`getMe`)
//! - anything else is echoed back as a reply
//!
//! # Usage
//!
//! ```bash
//! # Long polling, token from the environment
//! TGBOT_TOKEN=123:abc cargo run --package echo-bot
//!
//! # Webhook, settings from a file
//! cargo run --package echo-bot -- --config ./tgbot.toml webhook
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tgbot::prelude::*;
use tgbot::core::User;
use tracing::{info, warn};

#[derive(Parser)]
#[command(version, about = "Echo bot for the Telegram Bot API")]
struct Cli {
    /// Configuration file; defaults to searching for tgbot.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the bot token from the configuration.
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy)]
enum Mode {
    /// Fetch updates with getUpdates (default).
    Polling,
    /// Register a webhook and receive pushed updates.
    Webhook,
}

async fn echo(ctx: Arc<Context>) -> Result<(), BoxError> {
    let update = ctx.update();
    let (Some(chat), Some(text)) = (update.chat_id(), update.text()) else {
        return Ok(());
    };

    let reply = match text.trim() {
        "/ping" => "Pong!".to_string(),
        "/me" => {
            let me: User = ctx.call(&GetMe {}).await?;
            format!("I am @{}", me.username.unwrap_or(me.first_name))
        }
        other => other.to_string(),
    };

    let mut message = SendMessage::new(chat, reply);
    if let Some(source) = update.any_message() {
        message = message.reply_to(source.message_id);
    }
    ctx.send(&message).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if let Some(token) = &cli.token {
        loader = loader.set("token", token);
    }
    let config = loader.load()?;
    init_logging(&config.logging);

    let client = tgbot::client(config.token.clone())?.with_api_url(&config.api_url);
    let bot = Arc::new(from_fn(client, echo));

    match cli.mode.unwrap_or(Mode::Polling) {
        Mode::Polling => {
            info!(workers = config.polling.workers, "Starting echo bot with long polling");
            Poller::new(bot, config.polling)
                .with_middleware(trace())
                .run_until(shutdown_signal())
                .await?;
        }
        Mode::Webhook => {
            info!(url = %config.webhook.webhook_url(), "Starting echo bot with a webhook");
            let server = WebhookServer::new(bot, config.webhook).with_middleware(trace());
            server.run_until(shutdown_signal()).await?;
            if let Err(e) = server.delete_webhook(false).await {
                warn!(error = %e, "Failed to remove webhook");
            }
        }
    }

    Ok(())
}
