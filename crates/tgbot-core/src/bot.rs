//! The bot capability consumed by the delivery engines.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::context::Context;
use crate::error::BoxError;

/// A running bot: credentials, transport and the per-update callback.
///
/// One instance is shared by whichever engine (polling or webhook) runs it.
///
/// # Example
///
/// ```rust,ignore
/// struct Echo {
///     client: ApiClient,
/// }
///
/// #[async_trait]
/// impl Bot for Echo {
///     fn client(&self) -> &ApiClient {
///         &self.client
///     }
///
///     async fn handle_update(&self, ctx: Arc<Context>) -> Result<(), BoxError> {
///         if let (Some(chat), Some(text)) = (ctx.update().chat_id(), ctx.update().text()) {
///             ctx.send(&SendMessage::new(chat, text)).await?;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Token, endpoint template and transport.
    fn client(&self) -> &ApiClient;

    /// Handles one update.
    async fn handle_update(&self, ctx: Arc<Context>) -> Result<(), BoxError>;
}

/// A [`Bot`] backed by a closure.
pub struct FnBot<F> {
    client: ApiClient,
    handler: F,
}

/// Builds a [`Bot`] from a client and an async closure.
pub fn from_fn<F, Fut>(client: ApiClient, handler: F) -> FnBot<F>
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    FnBot { client, handler }
}

#[async_trait]
impl<F, Fut> Bot for FnBot<F>
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn handle_update(&self, ctx: Arc<Context>) -> Result<(), BoxError> {
        (self.handler)(ctx).await
    }
}
