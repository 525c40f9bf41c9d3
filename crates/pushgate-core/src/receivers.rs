//! Capabilities supplied by the host application.
//!
//! The pipeline calls into these traits; it never implements them itself
//! outside of tests.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::errors::PushError;
use crate::types::{Message, ScreenKey, TokenUpdate};

/// Failure reported by a host-supplied receiver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ReceiverError {
    message: String,
}

impl ReceiverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by the platform token source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TokenSourceError {
    message: String,
}

impl TokenSourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Platform push token retrieval.
pub trait TokenSource: Send + Sync {
    fn retrieve(&self) -> Result<String, TokenSourceError>;
}

/// First-stage handler that sees every notification.
///
/// The returned future is the completion signal: UI receivers for the same
/// message only start once it has resolved with `Ok`.
pub trait DataReceiver: Send + Sync + 'static {
    fn on_notification(&self, message: Message) -> BoxFuture<'static, Result<(), ReceiverError>>;
}

/// Second-stage handler used while the app is backgrounded.
pub trait BackgroundReceiver: Send + Sync + 'static {
    fn on_notification(&self, message: &Message);
}

/// Second-stage handler owned by a visible screen.
pub trait ForegroundReceiver: Send + Sync + 'static {
    /// Called when the message has no target or its target matches this receiver.
    fn on_target_notification(&self, message: &Message);

    /// Called when the message targets a screen this receiver does not match.
    fn on_mismatch_target_notification(&self, message: &Message, screen: &ScreenKey);

    /// Whether `target` names this receiver's screen.
    fn matches_target(&self, _target: &str) -> bool {
        false
    }
}

/// Observer of token refresh outcomes.
pub trait TokenRefreshReceiver: Send + Sync + 'static {
    fn on_token_refreshed(&self, update: Result<&TokenUpdate, &PushError>);
}

type MakeForeground = dyn Fn() -> Arc<dyn ForegroundReceiver> + Send + Sync;

/// How a screen's foreground receiver is produced for each routed message.
#[derive(Clone)]
pub enum ForegroundFactory {
    /// Every message goes to the same receiver instance.
    SharedInstance(Arc<dyn ForegroundReceiver>),
    /// A new receiver instance is constructed for every message.
    NewInstancePerCall(Arc<MakeForeground>),
}

impl ForegroundFactory {
    pub fn shared<R: ForegroundReceiver>(receiver: Arc<R>) -> Self {
        Self::SharedInstance(receiver)
    }

    pub fn per_call<F, R>(make: F) -> Self
    where
        F: Fn() -> Arc<R> + Send + Sync + 'static,
        R: ForegroundReceiver,
    {
        Self::NewInstancePerCall(Arc::new(move || make() as Arc<dyn ForegroundReceiver>))
    }

    /// Resolve the receiver that should handle the next message.
    pub fn instance(&self) -> Arc<dyn ForegroundReceiver> {
        match self {
            Self::SharedInstance(receiver) => Arc::clone(receiver),
            Self::NewInstancePerCall(make) => make(),
        }
    }

    pub fn policy(&self) -> &'static str {
        match self {
            Self::SharedInstance(_) => "shared",
            Self::NewInstancePerCall(_) => "per_call",
        }
    }
}

impl std::fmt::Debug for ForegroundFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ForegroundFactory").field(&self.policy()).finish()
    }
}
