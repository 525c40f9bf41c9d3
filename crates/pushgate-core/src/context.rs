//! The owned notification context.
//!
//! [`PushContext`] holds visibility state, foreground registrations, the
//! token state, and the pipeline worker. It is created once at application
//! start via [`PushContext::builder`] and torn down with
//! [`PushContext::shutdown`].
//!
//! Messages are processed one at a time, in arrival order:
//! 1. The data receiver runs on its own task ([`DataDispatchStage`]).
//! 2. Once its completion signal resolves, the router picks a UI receiver
//!    and runs it on the blocking pool.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use pushgate_config::PipelineSettings;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::{DataDispatchStage, UiDispatchRouter};
use crate::errors::{PushError, PushgateError};
use crate::receivers::{
    BackgroundReceiver, DataReceiver, ForegroundFactory, TokenRefreshReceiver, TokenSource,
};
use crate::registry::RegistrationRegistry;
use crate::token::{TokenState, TokenSubscription};
use crate::types::{LifecycleEvent, Message, RouteOutcome, ScreenKey, TokenUpdate};
use crate::visibility::{AppVisibilityTracker, ScreenStop, VisibilitySnapshot};

type RouteResult = Result<RouteOutcome, PushError>;

struct Envelope {
    message: Message,
    reply: oneshot::Sender<RouteResult>,
}

/// Builder for [`PushContext`].
#[derive(Default)]
pub struct PushContextBuilder {
    data_receiver: Option<Arc<dyn DataReceiver>>,
    background_receiver: Option<Arc<dyn BackgroundReceiver>>,
    token_source: Option<Arc<dyn TokenSource>>,
    settings: PipelineSettings,
}

impl PushContextBuilder {
    pub fn data_receiver<R: DataReceiver>(mut self, receiver: Arc<R>) -> Self {
        self.data_receiver = Some(receiver);
        self
    }

    pub fn background_receiver<R: BackgroundReceiver>(mut self, receiver: Arc<R>) -> Self {
        self.background_receiver = Some(receiver);
        self
    }

    pub fn token_source<S: TokenSource + 'static>(mut self, source: Arc<S>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate the registered capabilities and start the pipeline worker.
    ///
    /// # Errors
    ///
    /// Returns `MissingDataReceiver`, `MissingBackgroundReceiver`, or
    /// `MissingTokenSource` when a required capability was not supplied.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn build(self) -> Result<PushContext, PushError> {
        let data_receiver = require(self.data_receiver, PushError::MissingDataReceiver)?;
        let background_receiver =
            require(self.background_receiver, PushError::MissingBackgroundReceiver)?;
        let token_source = require(self.token_source, PushError::MissingTokenSource)?;
        let settings = self.settings;

        let visibility = Arc::new(AppVisibilityTracker::new());
        let registry = Arc::new(RegistrationRegistry::new());
        let token = TokenState::new(token_source, settings.token_channel_capacity);

        let stage = DataDispatchStage::new(data_receiver);
        let router = UiDispatchRouter::new(
            Arc::clone(&visibility),
            Arc::clone(&registry),
            background_receiver,
            settings.target_key.clone(),
        );

        let (intake_tx, intake_rx) = mpsc::channel(settings.queue_capacity.max(1));
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(run_pipeline(intake_rx, stage, router, shutdown.clone()));

        info!(
            event = "core.context.init_completed",
            queue_capacity = settings.queue_capacity,
            target_key = %settings.target_key,
        );

        Ok(PushContext {
            visibility,
            registry,
            token,
            settings,
            intake: intake_tx,
            shutdown,
            worker: Mutex::new(Some(worker)),
        })
    }
}

fn require<T>(value: Option<T>, missing: PushError) -> Result<T, PushError> {
    value.ok_or_else(|| {
        error!(
            event = "core.context.init_failed",
            error_code = missing.error_code(),
            error = %missing,
        );
        missing
    })
}

/// Application-scoped notification routing context.
pub struct PushContext {
    visibility: Arc<AppVisibilityTracker>,
    registry: Arc<RegistrationRegistry>,
    token: TokenState,
    settings: PipelineSettings,
    intake: mpsc::Sender<Envelope>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PushContext {
    pub fn builder() -> PushContextBuilder {
        PushContextBuilder::default()
    }

    // --- Inbound notifications ---

    /// Queue an inbound platform notification.
    ///
    /// Waits only for queue capacity, not for processing. Await the
    /// returned [`Delivery`] to learn which receiver got the message;
    /// dropping it does not cancel delivery.
    pub async fn on_notification_received(
        &self,
        sender: impl Into<String>,
        payload: BTreeMap<String, String>,
    ) -> Delivery {
        self.deliver(Message::new(sender, payload)).await
    }

    pub async fn deliver(&self, message: Message) -> Delivery {
        let (reply, pending) = oneshot::channel();
        if self.shutdown.is_cancelled() {
            return Delivery::closed(&message);
        }

        let sender = message.sender().to_string();
        match self.intake.send(Envelope { message, reply }).await {
            Ok(()) => {
                debug!(event = "core.context.message_queued", sender = %sender);
                Delivery::pending(pending)
            }
            Err(mpsc::error::SendError(envelope)) => Delivery::closed(&envelope.message),
        }
    }

    /// Queue a notification from a thread that is not running async code.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn blocking_deliver(&self, message: Message) -> Delivery {
        let (reply, pending) = oneshot::channel();
        if self.shutdown.is_cancelled() {
            return Delivery::closed(&message);
        }

        match self.intake.blocking_send(Envelope { message, reply }) {
            Ok(()) => Delivery::pending(pending),
            Err(mpsc::error::SendError(envelope)) => Delivery::closed(&envelope.message),
        }
    }

    // --- Lifecycle ---

    /// A screen became visible. Its receiver, if given, is registered
    /// before the screen becomes active.
    pub fn on_screen_started(&self, screen: ScreenKey, receiver: Option<ForegroundFactory>) {
        if let Some(factory) = receiver {
            self.registry.register(screen.clone(), factory);
        }
        self.visibility.on_screen_started(&screen);
    }

    /// One instance of a screen is no longer visible.
    ///
    /// The registration is removed only when the last instance of the screen
    /// stops. In-flight receiver calls are not cancelled.
    pub fn on_screen_stopped(&self, screen: &ScreenKey) -> ScreenStop {
        let stop = self.visibility.on_screen_stopped(screen);
        if stop == ScreenStop::Stopped {
            self.registry.unregister(screen);
        }
        stop
    }

    pub fn handle_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::ApplicationCreated => {
                self.visibility.reset();
                self.registry.clear();
                info!(event = "core.context.application_created");
            }
            LifecycleEvent::ScreenStarted { screen, receiver } => {
                self.on_screen_started(screen, receiver)
            }
            LifecycleEvent::ScreenStopped { screen } => {
                self.on_screen_stopped(&screen);
            }
        }
    }

    pub fn is_background(&self) -> bool {
        self.visibility.is_background()
    }

    pub fn visibility(&self) -> VisibilitySnapshot {
        self.visibility.snapshot()
    }

    pub fn registry(&self) -> &RegistrationRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    // --- Token ---

    pub fn current_token(&self) -> Result<String, PushError> {
        self.token.retrieve()
    }

    /// The platform reported a token change; fetch and publish it.
    pub fn on_token_refreshed(&self) -> Result<TokenUpdate, PushError> {
        self.token.refresh()
    }

    pub fn subscribe_token_refresh(&self) -> TokenSubscription {
        self.token.subscribe()
    }

    pub fn on_refresh_token<R: TokenRefreshReceiver>(&self, receiver: Arc<R>) {
        self.token.add_receiver(receiver);
    }

    // --- Teardown ---

    /// Stop accepting notifications, finish the queued ones, and stop the
    /// worker. Registrations and visibility are cleared afterwards.
    pub async fn shutdown(&self) {
        info!(event = "core.context.shutdown_started");
        self.shutdown.cancel();

        let worker = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            error!(event = "core.context.worker_join_failed", error = %e);
        }

        self.registry.clear();
        self.visibility.reset();
        info!(event = "core.context.shutdown_completed");
    }
}

impl Drop for PushContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// The eventual routing result for one queued message.
pub struct Delivery {
    pending: Option<oneshot::Receiver<RouteResult>>,
}

impl Delivery {
    fn pending(pending: oneshot::Receiver<RouteResult>) -> Self {
        Self {
            pending: Some(pending),
        }
    }

    fn closed(message: &Message) -> Self {
        warn!(
            event = "core.context.message_rejected",
            sender = message.sender(),
            reason = "pipeline closed"
        );
        Self { pending: None }
    }
}

impl Future for Delivery {
    type Output = RouteResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.pending.as_mut() {
            Some(pending) => Pin::new(pending)
                .poll(cx)
                .map(|reply| reply.unwrap_or(Err(PushError::PipelineClosed))),
            None => Poll::Ready(Err(PushError::PipelineClosed)),
        }
    }
}

async fn run_pipeline(
    mut intake: mpsc::Receiver<Envelope>,
    stage: DataDispatchStage,
    router: UiDispatchRouter,
    shutdown: CancellationToken,
) {
    info!(event = "core.pipeline.started");

    loop {
        tokio::select! {
            envelope = intake.recv() => match envelope {
                Some(envelope) => process_envelope(&stage, &router, envelope).await,
                None => break,
            },
            _ = shutdown.cancelled() => {
                intake.close();
                let mut drained = 0usize;
                while let Some(envelope) = intake.recv().await {
                    process_envelope(&stage, &router, envelope).await;
                    drained += 1;
                }
                debug!(event = "core.pipeline.drained", drained = drained);
                break;
            }
        }
    }

    info!(event = "core.pipeline.stopped");
}

async fn process_envelope(
    stage: &DataDispatchStage,
    router: &UiDispatchRouter,
    envelope: Envelope,
) {
    let Envelope { message, reply } = envelope;
    let result = route_message(stage, router, message).await;
    // Callers are free to drop their Delivery.
    let _ = reply.send(result);
}

async fn route_message(
    stage: &DataDispatchStage,
    router: &UiDispatchRouter,
    message: Message,
) -> RouteResult {
    let sender = message.sender().to_string();

    if let Err(e) = stage.dispatch(&message).wait().await {
        error!(
            event = "core.pipeline.data_stage_failed",
            sender = %sender,
            error = %e,
        );
        return Err(e);
    }

    // UI receivers are synchronous host callbacks; keep them off the async workers.
    let router = router.clone();
    let result = match tokio::task::spawn_blocking(move || router.route(&message)).await {
        Ok(result) => result,
        Err(e) => Err(PushError::UiReceiverFailed {
            message: e.to_string(),
        }),
    };

    match &result {
        Ok(outcome) => info!(
            event = "core.pipeline.message_routed",
            sender = %sender,
            outcome = %outcome,
        ),
        Err(e) if e.is_dropped_notification() => warn!(
            event = "core.pipeline.message_dropped",
            sender = %sender,
            error_code = e.error_code(),
            error = %e,
        ),
        Err(e) => error!(
            event = "core.pipeline.ui_stage_failed",
            sender = %sender,
            error = %e,
        ),
    }

    result
}
