//! # tgbot Core
//!
//! Protocol types and request execution for the Bot API.
//!
//! ## Layers
//!
//! ### Protocol
//!
//! - **Request bodies**: the [`RequestBody`] capability every API method implements
//! - **Envelope**: the uniform `{ok, result, error_code, ...}` response wrapper ([`Envelope`])
//! - **Updates**: typed inbound events ([`Update`], [`UpdateType`])
//!
//! ### Execution
//!
//! - **Transport seam**: [`HttpTransport`], implemented by `tgbot-transport`
//! - **Executor**: [`execute`] and [`execute_into`], one HTTP call per invocation
//! - **Client**: [`ApiClient`] bundles token, endpoint template and transport
//!
//! ### Handling
//!
//! - **Bot**: the per-update callback consumed by the delivery engines ([`Bot`])
//! - **Context**: per-update state with follow-up calls ([`Context`])
//! - **Middleware**: tower-based handler chain ([`Middleware`], [`compose`])
//!
//! ```text
//! ┌──────────────┐    ┌──────────┐    ┌───────────────┐    ┌──────────┐
//! │ RequestBody  │───▶│ execute  │───▶│ HttpTransport │───▶│ Envelope │
//! └──────────────┘    └──────────┘    └───────────────┘    └──────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tgbot_core::{ApiClient, Context, from_fn};
//!
//! let client = ApiClient::new(token, transport);
//! let bot = from_fn(client, |ctx: Arc<Context>| async move {
//!     tracing::info!(update_id = ctx.update().update_id, "got update");
//!     Ok(())
//! });
//! ```

pub mod api_url;
pub mod bot;
pub mod client;
pub mod context;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod handler;
pub mod request;
pub mod transport;
pub mod types;
pub mod update;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api_url::{ApiUrl, DEFAULT_API_URL};
pub use bot::{Bot, FnBot, from_fn};
pub use client::ApiClient;
pub use context::Context;
pub use envelope::Envelope;
pub use error::{
    ApiError, ApiResult, BoxError, HandlerError, ResponseParameters, TransportError,
    TransportResult, ValidationError, ValidationResult,
};
pub use executor::{ExecuteOptions, execute, execute_into};
pub use handler::{
    BotService, Middleware, Next, RecoverLayer, TraceLayer, UpdateService, bot_service, compose,
    recover, trace,
};
pub use request::{JSON_CONTENT_TYPE, MULTIPART_CONTENT_TYPE, RequestBody, json_body};
pub use transport::{FormPart, FormValue, HttpBody, HttpRequest, HttpResponse, HttpTransport};
pub use types::{CallbackQuery, Chat, Message, User};
pub use update::{UnknownUpdateType, Update, UpdateType, validate_update_types};

// Re-exports used by downstream crates and the `json_request!` macro.
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
