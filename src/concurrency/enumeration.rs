//! Consumer-side handle over a running traversal

use crate::concurrency::cancel::CancelToken;
use crate::concurrency::handoff::Fallible;
use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Stops a traversal and waits for its stage threads to exit
///
/// Clones share the same stages. The first `cancel` joins every stage while
/// holding the lock, so concurrent callers return only after termination and
/// later calls are no-ops.
#[derive(Clone, Debug)]
pub struct Canceller {
    token: CancelToken,
    stages: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Canceller {
    pub(crate) fn new(token: CancelToken) -> Self {
        Self {
            token,
            stages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn adopt(&self, stage: JoinHandle<()>) {
        self.stages.lock().push(stage);
    }

    pub fn cancel(&self) {
        self.token.cancel();

        let mut stages = self.stages.lock();
        if stages.is_empty() {
            return;
        }

        let current = thread::current().id();
        let count = stages.len();
        for stage in stages.drain(..) {
            if stage.thread().id() == current {
                continue;
            }
            if stage.join().is_err() {
                warn!("Stage thread panicked outside its fault boundary");
            }
        }
        debug!(stages = count, "Traversal cancelled and stages joined");
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Lazy stream of traversal results
///
/// Results arrive in tree order. A producer fault arrives as a final `Err`
/// item, after which the stream ends. Iterate it from synchronous code, or
/// poll it as a [`Stream`] from async code; the blocking [`Iterator`] must not
/// be driven from inside an async runtime.
///
/// With the default handoff capacity of one, a producer resumes only after
/// the previous value has been taken, so a callback traversal never runs a
/// decision function ahead of the consumer. The two-stage pipelines still
/// locate the next leaf while the converted one waits to be taken. A capacity
/// of `c` lets each stage run up to `c - 1` values ahead.
///
/// Dropping the enumeration cancels it.
#[derive(Debug)]
pub struct Enumeration<T> {
    receiver: mpsc::Receiver<Fallible<T>>,
    canceller: Canceller,
}

impl<T> Enumeration<T> {
    pub(crate) fn new(receiver: mpsc::Receiver<Fallible<T>>, canceller: Canceller) -> Self {
        Self {
            receiver,
            canceller,
        }
    }

    /// A handle that can cancel this enumeration from another thread
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Stop the traversal and wait for every stage to exit
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.canceller.is_cancelled()
    }
}

impl<T> Iterator for Enumeration<T> {
    type Item = Fallible<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.canceller.is_cancelled() {
            return None;
        }
        self.receiver.blocking_recv()
    }
}

impl<T> Stream for Enumeration<T> {
    type Item = Fallible<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.canceller.is_cancelled() {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}

impl<T> Unpin for Enumeration<T> {}

impl<T> Drop for Enumeration<T> {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}
