//! Webhook delivery engine.
//!
//! The platform pushes each update as a JSON `POST` to one path. The endpoint
//! decodes it, builds a [`Context`] and runs the handler chain:
//!
//! | Outcome                         | Status |
//! |---------------------------------|--------|
//! | Secret header missing/mismatch  | 401    |
//! | Body is not an update           | 400    |
//! | Handler error or panic          | 400    |
//! | Handler success                 | 200    |
//!
//! [`WebhookServer::start`] registers the public URL with `setWebhook` before
//! binding; if registration fails nothing is bound.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use parking_lot::Mutex;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

use tgbot_core::{
    ApiClient, ApiResult, Bot, Context, ExecuteOptions, Middleware, Update, UpdateService,
    bot_service, compose, recover,
};
use tgbot_methods::{DeleteWebhook, InputFile, SetWebhook};

use crate::config::{ConfigError, WebhookConfig, validate_token, validate_webhook};
use crate::error::{RuntimeError, RuntimeResult};
use crate::state::EngineState;

/// Header carrying the secret registered with `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared state for the endpoint.
#[derive(Clone)]
struct AppState {
    client: ApiClient,
    service: UpdateService,
    secret: Option<Arc<str>>,
}

/// Webhook engine for one bot.
pub struct WebhookServer<B> {
    bot: Arc<B>,
    config: WebhookConfig,
    middlewares: Vec<Middleware>,
    state: Mutex<EngineState>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    done: watch::Sender<bool>,
}

impl<B: Bot> WebhookServer<B> {
    /// Creates a server. The handler chain defaults to `[recover()]`.
    pub fn new(bot: Arc<B>, config: WebhookConfig) -> Self {
        Self {
            bot,
            config,
            middlewares: vec![recover()],
            state: Mutex::new(EngineState::Idle),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            done: watch::Sender::new(false),
        }
    }

    /// Appends a middleware; it runs inside the ones already registered.
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Replaces the middleware list, including the default recovery.
    pub fn with_middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.middlewares = middlewares;
        self
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Returns the bound address once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Builds the endpoint router without binding or registering.
    pub fn router(&self) -> Router {
        let state = AppState {
            client: self.bot.client().clone(),
            service: compose(bot_service(Arc::clone(&self.bot)), &self.middlewares),
            secret: self.config.secret_token.as_deref().map(Arc::from),
        };
        Router::new()
            .route(&self.config.path, post(handle_update))
            .with_state(state)
    }

    /// Registers the webhook, binds the listener and serves until stopped.
    pub async fn start(&self) -> RuntimeResult<()> {
        {
            let mut state = self.state.lock();
            if *state != EngineState::Idle {
                return Err(RuntimeError::NotIdle(state.as_str()));
            }
            validate_token(self.bot.client().token())?;
            validate_webhook(&self.config)?;
            if self.config.public_url.is_empty() {
                return Err(ConfigError::missing_field("webhook.public_url").into());
            }
            *state = EngineState::Running;
        }

        let result = self.serve().await;

        *self.state.lock() = EngineState::Stopped;
        self.done.send_replace(true);
        info!("Webhook server stopped");
        result
    }

    async fn serve(&self) -> RuntimeResult<()> {
        let request = self.registration()?;
        let options = ExecuteOptions::new().with_cancel(self.cancel.clone());
        match self.bot.client().send_with(&request, options).await {
            Ok(()) => info!(url = %request.url, "Webhook registered"),
            Err(e) if e.is_cancelled() => return Ok(()),
            Err(e) => return Err(RuntimeError::Registration(e)),
        }

        let listener = TcpListener::bind(&self.config.listen)
            .await
            .map_err(|source| RuntimeError::Bind {
                addr: self.config.listen.clone(),
                source,
            })?;
        let addr = listener.local_addr()?;
        *self.local_addr.lock() = Some(addr);
        info!(addr = %addr, path = %self.config.path, "Webhook server listening");

        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned());
        let grace = self.config.shutdown_timeout();

        tokio::select! {
            result = server.into_future() => result?,
            () = async {
                self.cancel.cancelled().await;
                tokio::time::sleep(grace).await;
            } => {
                warn!(
                    timeout_secs = self.config.shutdown_timeout_secs,
                    "Graceful shutdown timed out, dropping in-flight requests"
                );
            }
        }
        Ok(())
    }

    fn registration(&self) -> RuntimeResult<SetWebhook> {
        let config = &self.config;
        let mut request =
            SetWebhook::new(config.webhook_url()).with_max_connections(config.max_connections);

        if let Some(path) = &config.certificate {
            let certificate =
                InputFile::from_path(path).map_err(|source| RuntimeError::Certificate {
                    path: path.clone(),
                    source,
                })?;
            request = request.with_certificate(certificate);
        }
        if let Some(ip) = &config.ip_address {
            request = request.with_ip_address(ip.clone());
        }
        if !config.allowed_updates.is_empty() {
            request = request.with_allowed_updates(config.allowed_updates.iter().cloned());
        }
        if config.drop_pending_updates {
            request = request.with_drop_pending_updates(true);
        }
        if let Some(secret) = &config.secret_token {
            request = request.with_secret_token(secret.clone());
        }
        Ok(request)
    }

    fn request_stop(&self) {
        let mut state = self.state.lock();
        match *state {
            EngineState::Running => {
                *state = EngineState::Stopping;
                info!("Stopping webhook server");
            }
            EngineState::Idle => {
                *state = EngineState::Stopped;
                self.done.send_replace(true);
            }
            EngineState::Stopping | EngineState::Stopped => {}
        }
        self.cancel.cancel();
    }

    /// Stops the server, waiting up to the shutdown timeout for in-flight
    /// requests. Returns once [`start`](Self::start) has finished.
    pub async fn stop(&self) {
        self.request_stop();
        let mut done = self.done.subscribe();
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Serves until `shutdown` resolves, then stops gracefully.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let run = self.start();
        tokio::pin!(run);
        tokio::select! {
            result = &mut run => return result,
            () = shutdown => self.request_stop(),
        }
        run.await
    }

    /// Removes the registered webhook. Not called on stop.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> ApiResult<bool> {
        let request = DeleteWebhook {
            drop_pending_updates: Some(drop_pending_updates),
        };
        self.bot.client().call(&request).await
    }
}

async fn handle_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        let matches = headers
            .get(SECRET_TOKEN_HEADER)
            .is_some_and(|given| secret_matches(given.as_bytes(), secret.as_bytes()));
        if !matches {
            warn!("Rejected webhook request with a wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update = match Update::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            debug!(error = %e, len = body.len(), "Malformed update payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    let update_id = update.update_id;
    let ctx = Arc::new(Context::new(state.client, update));
    match state.service.oneshot(ctx).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!(update_id, error = %e, "Webhook handler failed");
            StatusCode::BAD_REQUEST
        }
    }
}

/// Compares in constant time for equal lengths.
fn secret_matches(given: &[u8], expected: &[u8]) -> bool {
    given.ct_eq(expected).into()
}
