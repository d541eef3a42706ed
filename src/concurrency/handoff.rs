//! Backpressured handoff between a producer stage and its consumer
//!
//! A stage runs on its own OS thread and pushes values through a bounded
//! channel. A send returns only once the consumer has taken the value, or
//! once the channel has a spare slot when its capacity exceeds one, so with
//! the default capacity the stage never works ahead of its consumer. Every
//! send races the cancellation token, so a blocked stage wakes up as soon as
//! the consumer cancels.

use crate::concurrency::cancel::CancelToken;
use crate::config::PowersetConfig;
use crate::error::PowersetError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Values travelling through a handoff; a fault is always the last one sent
pub type Fallible<T> = Result<T, PowersetError>;

/// Sending half of a handoff, bound to the traversal's cancellation token
pub struct HandoffSender<T> {
    sender: mpsc::Sender<T>,
    token: CancelToken,
}

impl<T> HandoffSender<T> {
    /// Block until the consumer has taken `value`
    ///
    /// Returns `Cancelled` if the token fires first or the receiving side is gone.
    pub fn send(&self, value: T) -> Result<(), PowersetError> {
        if self.token.is_cancelled() {
            return Err(PowersetError::Cancelled);
        }

        futures::executor::block_on(async {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(PowersetError::Cancelled),
                delivered = self.deliver(value) => delivered,
            }
        })
    }

    async fn deliver(&self, value: T) -> Result<(), PowersetError> {
        self.sender
            .send(value)
            .await
            .map_err(|_| PowersetError::Cancelled)?;
        // A permit is only granted once a slot frees up again.
        let permit = self
            .sender
            .reserve()
            .await
            .map_err(|_| PowersetError::Cancelled)?;
        drop(permit);
        Ok(())
    }
}

/// Bounded channel of `capacity` slots tied to `token`
pub fn handoff<T>(capacity: usize, token: CancelToken) -> (HandoffSender<T>, mpsc::Receiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (HandoffSender { sender, token }, receiver)
}

/// Run `body` on a dedicated thread that feeds `out`
///
/// A fault returned by `body`, or a panic inside it, is forwarded to `out` as
/// the final value. Cancellation is not a fault and is never forwarded.
pub fn spawn_stage<T, F>(
    config: &PowersetConfig,
    stage: &'static str,
    out: HandoffSender<Fallible<T>>,
    body: F,
) -> Result<JoinHandle<()>, PowersetError>
where
    T: Send + 'static,
    F: FnOnce(&HandoffSender<Fallible<T>>) -> Result<(), PowersetError> + Send + 'static,
{
    let mut builder = thread::Builder::new().name(format!("{}-{}", config.thread_name, stage));
    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }

    let handle = builder.spawn(move || {
        debug!(stage, "Stage started");
        let fault = match panic::catch_unwind(AssertUnwindSafe(|| body(&out))) {
            Ok(Ok(())) => None,
            Ok(Err(err)) if err.is_cancelled() => {
                debug!(stage, "Stage cancelled");
                None
            }
            Ok(Err(err)) => Some(err),
            Err(payload) => Some(PowersetError::ProducerPanicked(panic_message(&*payload))),
        };

        if let Some(fault) = fault {
            warn!(stage, error = %fault, "Stage failed");
            if out.send(Err(fault)).is_err() {
                debug!(stage, "Consumer gone before fault could be delivered");
            }
        }
        debug!(stage, "Stage finished");
    })?;

    Ok(handle)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
