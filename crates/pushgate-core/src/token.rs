//! Push token cache and refresh channel.
//!
//! Refresh outcomes are published on a `tokio::sync::broadcast` channel.
//! A failed fetch is published as an `Err` and then terminates that channel
//! instance. The next `subscribe()` or `refresh()` opens a new generation,
//! so a single platform failure never leaves the app unable to refresh.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, error, info, warn};

use crate::errors::PushError;
use crate::receivers::{TokenRefreshReceiver, TokenSource};
use crate::types::TokenUpdate;

/// One refresh outcome as seen by subscribers.
pub type TokenEvent = Result<TokenUpdate, PushError>;

struct TokenInner {
    current: Option<String>,
    channel: Option<broadcast::Sender<TokenEvent>>,
    generation: u64,
}

/// Last known push token plus the refresh channel.
pub struct TokenState {
    source: Arc<dyn TokenSource>,
    inner: Mutex<TokenInner>,
    receivers: RwLock<Vec<Arc<dyn TokenRefreshReceiver>>>,
    channel_capacity: usize,
}

impl TokenState {
    pub fn new(source: Arc<dyn TokenSource>, channel_capacity: usize) -> Self {
        Self {
            source,
            inner: Mutex::new(TokenInner {
                current: None,
                channel: None,
                generation: 0,
            }),
            receivers: RwLock::new(Vec::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TokenInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!(event = "core.token.lock_poisoned");
                poisoned.into_inner()
            }
        }
    }

    /// Return the cached token, asking the platform once if none is cached.
    pub fn retrieve(&self) -> Result<String, PushError> {
        if let Some(token) = self.lock().current.clone() {
            return Ok(token);
        }

        match self.source.retrieve() {
            Ok(token) => {
                let mut inner = self.lock();
                let token = inner.current.get_or_insert(token).clone();
                Ok(token)
            }
            Err(e) => {
                warn!(event = "core.token.retrieve_failed", error = %e);
                Err(PushError::TokenUnavailable)
            }
        }
    }

    /// Fetch a new token and publish the outcome.
    ///
    /// On success the token is cached, sent to subscribers, and handed to
    /// every registered [`TokenRefreshReceiver`]. On failure the error is
    /// sent to current subscribers and the channel is closed; nothing is
    /// cached and no value is emitted.
    pub fn refresh(&self) -> Result<TokenUpdate, PushError> {
        debug!(event = "core.token.refresh_started");

        let outcome = match self.source.retrieve() {
            Ok(token) => {
                let update = TokenUpdate::new(token);
                let mut inner = self.lock();
                inner.current = Some(update.token().to_string());
                let sender = self.open_channel(&mut inner);
                // No subscribers is fine; receivers below still get the update.
                let _ = sender.send(Ok(update.clone()));
                info!(
                    event = "core.token.refresh_completed",
                    generation = inner.generation
                );
                Ok(update)
            }
            Err(e) => {
                let failure = PushError::TokenFetchFailed {
                    message: e.to_string(),
                };
                let mut inner = self.lock();
                if let Some(sender) = inner.channel.take() {
                    let _ = sender.send(Err(failure.clone()));
                }
                warn!(
                    event = "core.token.refresh_failed",
                    generation = inner.generation,
                    error = %failure
                );
                Err(failure)
            }
        };

        self.notify_receivers(&outcome);
        outcome
    }

    /// Subscribe to refresh outcomes on the current channel generation.
    pub fn subscribe(&self) -> TokenSubscription {
        let mut inner = self.lock();
        let receiver = self.open_channel(&mut inner).subscribe();
        TokenSubscription {
            generation: inner.generation,
            receiver,
        }
    }

    /// Register an observer for every future refresh outcome.
    pub fn add_receiver(&self, receiver: Arc<dyn TokenRefreshReceiver>) {
        match self.receivers.write() {
            Ok(mut receivers) => receivers.push(receiver),
            Err(poisoned) => poisoned.into_inner().push(receiver),
        }
    }

    /// Number of channel instances opened so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn open_channel(&self, inner: &mut TokenInner) -> broadcast::Sender<TokenEvent> {
        if let Some(sender) = &inner.channel {
            return sender.clone();
        }

        let (sender, _) = broadcast::channel(self.channel_capacity);
        inner.generation += 1;
        inner.channel = Some(sender.clone());
        debug!(
            event = "core.token.channel_opened",
            generation = inner.generation
        );
        sender
    }

    fn notify_receivers(&self, outcome: &TokenEvent) {
        let receivers = match self.receivers.read() {
            Ok(receivers) => receivers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for receiver in receivers {
            receiver.on_token_refreshed(outcome.as_ref());
        }
    }
}

/// Receiving end of one refresh channel generation.
pub struct TokenSubscription {
    generation: u64,
    receiver: broadcast::Receiver<TokenEvent>,
}

impl TokenSubscription {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the next refresh outcome.
    ///
    /// Returns `None` once this channel generation has terminated.
    pub async fn next(&mut self) -> Option<TokenEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(event = "core.token.subscriber_lagged", skipped = skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next refresh outcome if one is already buffered.
    ///
    /// Returns `None` when nothing is buffered or the channel has terminated.
    pub fn try_next(&mut self) -> Option<TokenEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(event = "core.token.subscriber_lagged", skipped = skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
