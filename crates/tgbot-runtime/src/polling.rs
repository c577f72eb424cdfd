//! Long-polling delivery engine.
//!
//! One fetch loop calls `getUpdates` and publishes each update onto a channel
//! shared by a pool of workers. Each worker runs the handler chain for one
//! update at a time.
//!
//! ```text
//!                       ┌──────────┐
//!                  ┌───▶│ worker 0 │──▶ middleware ──▶ Bot::handle_update
//! ┌────────────┐   │    └──────────┘
//! │ fetch loop │───┤         ...
//! └────────────┘   │    ┌──────────┐
//!   owns cursor    └───▶│ worker N │──▶ middleware ──▶ Bot::handle_update
//!                       └──────────┘
//! ```
//!
//! The cursor is advanced to `update_id + 1` as soon as an update has been
//! handed to a worker, not when its handler finishes. An update taken off the
//! channel is therefore acknowledged even if the process dies while handling
//! it: delivery is at-most-once.
//!
//! Fetch errors go to the error hook and the call is retried immediately.
//!
//! On stop, handlers already running get `shutdown_timeout_secs` to finish;
//! any still running after that are aborted.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, trace, warn};

use tgbot_core::{
    ApiClient, Bot, Context, ExecuteOptions, Middleware, Update, UpdateService, bot_service,
    compose, recover,
};
use tgbot_methods::GetUpdates;

use crate::config::{PollingConfig, validate_polling, validate_token};
use crate::error::{PollError, RuntimeError, RuntimeResult};
use crate::state::EngineState;

/// Receives every failure the poller recovers from.
pub type ErrorHook = Arc<dyn Fn(&PollError) + Send + Sync>;

fn log_error(err: &PollError) {
    error!(error = %err, "Long polling error");
}

/// Long-polling engine for one bot.
///
/// # Example
///
/// ```rust,ignore
/// let poller = Arc::new(Poller::new(bot, config.polling).with_middleware(trace()));
///
/// let p = poller.clone();
/// tokio::spawn(async move { shutdown_signal().await; p.stop() });
///
/// poller.start().await?;
/// ```
pub struct Poller<B> {
    bot: Arc<B>,
    config: PollingConfig,
    middlewares: Vec<Middleware>,
    on_error: ErrorHook,
    state: Mutex<EngineState>,
    cancel: CancellationToken,
    offset: Arc<Mutex<Option<i64>>>,
}

impl<B: Bot> Poller<B> {
    /// Creates a poller. The handler chain defaults to `[recover()]`.
    pub fn new(bot: Arc<B>, config: PollingConfig) -> Self {
        Self {
            bot,
            config,
            middlewares: vec![recover()],
            on_error: Arc::new(log_error),
            state: Mutex::new(EngineState::Idle),
            cancel: CancellationToken::new(),
            offset: Arc::new(Mutex::new(None)),
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

    /// Sets the error hook. The default logs with `tracing::error!`.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PollError) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(hook);
        self
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Returns the current cursor, `None` until the first update is handed off.
    pub fn offset(&self) -> Option<i64> {
        *self.offset.lock()
    }

    /// Validates the configuration, then polls until [`stop`](Self::stop) is
    /// called. Returns once the fetch loop and every worker have exited.
    pub async fn start(&self) -> RuntimeResult<()> {
        {
            let mut state = self.state.lock();
            if *state != EngineState::Idle {
                return Err(RuntimeError::NotIdle(state.as_str()));
            }
            validate_token(self.bot.client().token())?;
            validate_polling(&self.config)?;
            *state = EngineState::Running;
        }

        info!(
            workers = self.config.workers,
            limit = self.config.limit,
            timeout_secs = self.config.timeout_secs,
            "Long polling started"
        );

        let client = self.bot.client().clone();
        let service = compose(bot_service(Arc::clone(&self.bot)), &self.middlewares);

        // Capacity 1: a publish waits until a worker is about to take the update.
        let (tx, rx) = mpsc::channel::<Update>(1);
        let rx = Arc::new(AsyncMutex::new(rx));

        let mut tasks = JoinSet::new();
        tasks.spawn(
            FetchLoop {
                client: client.clone(),
                config: self.config.clone(),
                cancel: self.cancel.clone(),
                tx,
                offset: Arc::clone(&self.offset),
                on_error: Arc::clone(&self.on_error),
            }
            .run(),
        );
        for id in 0..self.config.workers {
            tasks.spawn(
                Worker {
                    id,
                    client: client.clone(),
                    service: service.clone(),
                    rx: Arc::clone(&rx),
                    cancel: self.cancel.clone(),
                    on_error: Arc::clone(&self.on_error),
                }
                .run(),
            );
        }

        let grace = self.config.shutdown_timeout();
        let timed_out = tokio::select! {
            () = drain(&mut tasks) => false,
            () = async {
                self.cancel.cancelled().await;
                tokio::time::sleep(grace).await;
            } => true,
        };
        if timed_out {
            warn!(
                timeout_secs = self.config.shutdown_timeout_secs,
                running = tasks.len(),
                "Handlers did not finish in time, aborting"
            );
            tasks.shutdown().await;
        }

        *self.state.lock() = EngineState::Stopped;
        info!("Long polling stopped");
        Ok(())
    }

    /// Requests shutdown. Blocking points observe it promptly; [`start`](Self::start)
    /// returns once every task has exited, aborting handlers that outlive the
    /// shutdown timeout.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match *state {
            EngineState::Running => {
                *state = EngineState::Stopping;
                info!("Stopping long polling");
            }
            EngineState::Idle => *state = EngineState::Stopped,
            EngineState::Stopping | EngineState::Stopped => {}
        }
        self.cancel.cancel();
    }

    /// Polls until `shutdown` resolves, then stops and waits for the tasks.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let run = self.start();
        tokio::pin!(run);
        tokio::select! {
            result = &mut run => return result,
            () = shutdown => self.stop(),
        }
        run.await
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Polling task panicked");
        }
    }
}

struct FetchLoop {
    client: ApiClient,
    config: PollingConfig,
    cancel: CancellationToken,
    tx: mpsc::Sender<Update>,
    offset: Arc<Mutex<Option<i64>>>,
    on_error: ErrorHook,
}

impl FetchLoop {
    async fn run(self) {
        let options = ExecuteOptions::new().with_cancel(self.cancel.clone());
        let mut cursor: Option<i64> = None;

        while !self.cancel.is_cancelled() {
            let request = self.request(cursor);
            let mut updates: Vec<Update> =
                match self.client.call_with(&request, options.clone()).await {
                    Ok(updates) => updates,
                    Err(e) if e.is_cancelled() => break,
                    Err(e) => {
                        debug!(error = %e, "getUpdates failed, retrying");
                        (self.on_error)(&PollError::Fetch(e));
                        tokio::task::yield_now().await;
                        continue;
                    }
                };

            trace!(count = updates.len(), offset = ?cursor, "Fetched updates");
            updates.sort_by_key(|u| u.update_id);

            for update in updates {
                let next = update.update_id + 1;
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => return,
                    sent = self.tx.send(update) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
                cursor = Some(cursor.map_or(next, |c| c.max(next)));
                *self.offset.lock() = cursor;
            }
        }
        debug!("Fetch loop exited");
    }

    fn request(&self, cursor: Option<i64>) -> GetUpdates {
        let mut request = GetUpdates::new()
            .with_limit(self.config.limit)
            .with_timeout(self.config.timeout_secs);
        if let Some(offset) = cursor {
            request = request.with_offset(offset);
        }
        if !self.config.allowed_updates.is_empty() {
            request = request.with_allowed_updates(self.config.allowed_updates.iter().cloned());
        }
        request
    }
}

struct Worker {
    id: usize,
    client: ApiClient,
    service: UpdateService,
    rx: Arc<AsyncMutex<mpsc::Receiver<Update>>>,
    cancel: CancellationToken,
    on_error: ErrorHook,
}

impl Worker {
    async fn run(self) {
        loop {
            let update = {
                let mut rx = self.rx.lock().await;
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    update = rx.recv() => match update {
                        Some(update) => update,
                        None => break,
                    },
                }
            };

            let update_id = update.update_id;
            trace!(worker = self.id, update_id, "Handling update");
            let ctx = Arc::new(
                Context::new(self.client.clone(), update).with_cancel(self.cancel.clone()),
            );
            if let Err(source) = self.service.clone().oneshot(ctx).await {
                (self.on_error)(&PollError::Handler { update_id, source });
            }
        }
        debug!(worker = self.id, "Worker exited");
    }
}
