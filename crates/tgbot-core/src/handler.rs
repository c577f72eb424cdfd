//! Handler chain built from tower services.
//!
//! The per-update callback of a [`Bot`] becomes an [`UpdateService`]; each
//! [`Middleware`] wraps one service into another. [`compose`] applies the
//! middleware list in reverse so the first entry ends up outermost:
//!
//! ```text
//! [A, B] + handler  ==>  A( B( handler ) )
//!
//! A before ─▶ B before ─▶ handler ─▶ B after ─▶ A after
//! ```
//!
//! Any tower [`Layer`] producing a compatible service can be used through
//! [`Middleware::from_layer`]; quick one-off middleware can be written with
//! [`Middleware::from_fn`].

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceExt};
use tower_layer::Layer;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::bot::Bot;
use crate::context::Context;
use crate::error::{BoxError, HandlerError};

/// Type-erased handler chain.
pub type UpdateService = BoxCloneSyncService<Arc<Context>, (), BoxError>;

// ============================================================================
// Root service
// ============================================================================

/// Calls [`Bot::handle_update`].
pub struct BotService<B> {
    bot: Arc<B>,
}

impl<B> Clone for BotService<B> {
    fn clone(&self) -> Self {
        Self {
            bot: Arc::clone(&self.bot),
        }
    }
}

impl<B: Bot> Service<Arc<Context>> for BotService<B> {
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let bot = Arc::clone(&self.bot);
        async move { bot.handle_update(ctx).await }.boxed()
    }
}

/// Wraps a bot's callback as the innermost service of a chain.
pub fn bot_service<B: Bot>(bot: Arc<B>) -> UpdateService {
    BoxCloneSyncService::new(BotService { bot })
}

// ============================================================================
// Middleware
// ============================================================================

type WrapFn = dyn Fn(UpdateService) -> UpdateService + Send + Sync;

/// Wraps a handler chain, producing a new one.
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<WrapFn>,
}

impl Middleware {
    /// Creates a middleware from a wrapping function.
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(UpdateService) -> UpdateService + Send + Sync + 'static,
    {
        Self {
            wrap: Arc::new(wrap),
        }
    }

    /// Creates a middleware from a tower layer.
    pub fn from_layer<L>(layer: L) -> Self
    where
        L: Layer<UpdateService> + Send + Sync + 'static,
        L::Service:
            Service<Arc<Context>, Response = (), Error = BoxError> + Clone + Send + Sync + 'static,
        <L::Service as Service<Arc<Context>>>::Future: Send + 'static,
    {
        Self::new(move |inner| BoxCloneSyncService::new(layer.layer(inner)))
    }

    /// Creates a middleware from an async function receiving the rest of the chain.
    ///
    /// ```rust,ignore
    /// let audit = Middleware::from_fn(|ctx, next: Next| async move {
    ///     info!(update_id = ctx.update().update_id, "before");
    ///     let result = next.run(ctx).await;
    ///     info!("after");
    ///     result
    /// });
    /// ```
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Context>, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |inner| {
            BoxCloneSyncService::new(FnService {
                f: Arc::clone(&f),
                inner,
            })
        })
    }

    /// Applies this middleware to `inner`.
    pub fn wrap(&self, inner: UpdateService) -> UpdateService {
        (self.wrap)(inner)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// The remainder of the chain, handed to [`Middleware::from_fn`] functions.
pub struct Next {
    inner: UpdateService,
}

impl Next {
    /// Runs the rest of the chain.
    pub async fn run(self, ctx: Arc<Context>) -> Result<(), BoxError> {
        self.inner.oneshot(ctx).await
    }
}

struct FnService<F> {
    f: Arc<F>,
    inner: UpdateService,
}

impl<F> Clone for FnService<F> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            inner: self.inner.clone(),
        }
    }
}

impl<F, Fut> Service<Arc<Context>> for FnService<F>
where
    F: Fn(Arc<Context>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let next = Next {
            inner: self.inner.clone(),
        };
        (self.f)(ctx, next).boxed()
    }
}

/// Wraps `root` with `middlewares`; the first middleware is the outermost.
pub fn compose(root: UpdateService, middlewares: &[Middleware]) -> UpdateService {
    middlewares
        .iter()
        .rev()
        .fold(root, |inner, middleware| middleware.wrap(inner))
}

// ============================================================================
// Recovery
// ============================================================================

/// Converts panics from the wrapped chain into [`HandlerError::Panicked`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverLayer;

impl<S> Layer<S> for RecoverLayer {
    type Service = RecoverService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RecoverService { inner }
    }
}

/// The [`Service`] produced by [`RecoverLayer`].
#[derive(Debug, Clone)]
pub struct RecoverService<S> {
    inner: S,
}

impl<S> Service<Arc<Context>> for RecoverService<S>
where
    S: Service<Arc<Context>, Response = (), Error = BoxError>,
    S::Future: Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let update_id = ctx.update().update_id;

        // Panics can happen while the future is built as well as while it runs.
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(ctx))) {
            Ok(fut) => fut,
            Err(payload) => {
                let err = HandlerError::from_panic(payload.as_ref());
                error!(update_id, error = %err, "Recovered from panic in update handler");
                return futures::future::ready(Err(err.into())).boxed();
            }
        };

        async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let err = HandlerError::from_panic(payload.as_ref());
                    error!(update_id, error = %err, "Recovered from panic in update handler");
                    Err(err.into())
                }
            }
        }
        .boxed()
    }
}

/// Panic isolation for the handler chain.
pub fn recover() -> Middleware {
    Middleware::from_layer(RecoverLayer)
}

// ============================================================================
// Tracing
// ============================================================================

/// Runs the wrapped chain inside an `update` span and logs its duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceLayer;

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService { inner }
    }
}

/// The [`Service`] produced by [`TraceLayer`].
#[derive(Debug, Clone)]
pub struct TraceService<S> {
    inner: S,
}

impl<S> Service<Arc<Context>> for TraceService<S>
where
    S: Service<Arc<Context>, Response = (), Error = BoxError>,
    S::Future: Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), BoxError>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        let update = ctx.update();
        let span = info_span!(
            "update",
            update_id = update.update_id,
            kind = update.kind().map_or("unknown", |k| k.as_str()),
        );
        let start = Instant::now();
        let fut = self.inner.call(ctx);

        async move {
            let result = fut.await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => debug!(elapsed_ms, "Update handled"),
                Err(e) => warn!(elapsed_ms, error = %e, "Update handler failed"),
            }
            result
        }
        .instrument(span)
        .boxed()
    }
}

/// Per-update span and timing.
pub fn trace() -> Middleware {
    Middleware::from_layer(TraceLayer)
}
