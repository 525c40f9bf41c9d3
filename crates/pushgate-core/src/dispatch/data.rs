use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::PushError;
use crate::receivers::{DataReceiver, ReceiverError};
use crate::types::Message;

/// Runs the data receiver for each message on its own task.
#[derive(Clone)]
pub struct DataDispatchStage {
    receiver: Arc<dyn DataReceiver>,
}

impl DataDispatchStage {
    pub fn new(receiver: Arc<dyn DataReceiver>) -> Self {
        Self { receiver }
    }

    /// Hand `message` to the data receiver.
    ///
    /// The receiver runs on a spawned task. The returned signal resolves
    /// only after the receiver's future has returned.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn dispatch(&self, message: &Message) -> CompletionSignal {
        let (done_tx, done_rx) = oneshot::channel();
        let receiver = Arc::clone(&self.receiver);
        let message = message.clone();

        debug!(event = "core.dispatch.data_started", sender = message.sender());

        tokio::spawn(async move {
            let result = receiver.on_notification(message).await;
            // The waiting side may have given up; nothing to report to.
            let _ = done_tx.send(result);
        });

        CompletionSignal { done: done_rx }
    }
}

/// Resolves once the data receiver for one message has finished.
#[must_use = "the UI stage must wait for the completion signal"]
pub struct CompletionSignal {
    done: oneshot::Receiver<Result<(), ReceiverError>>,
}

impl CompletionSignal {
    /// Wait for the data receiver to finish.
    ///
    /// A receiver that panics drops its end of the channel and is reported
    /// as a failure.
    pub async fn wait(self) -> Result<(), PushError> {
        match self.done.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PushError::DataReceiverFailed {
                message: e.to_string(),
            }),
            Err(_) => Err(PushError::DataReceiverFailed {
                message: "data receiver panicked before completing".to_string(),
            }),
        }
    }
}
