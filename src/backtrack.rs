//! Backtracking callback protocol
//!
//! A caller-supplied decision function runs at every node the walker reaches:
//! the root, every internal node and every leaf. It receives the node's path,
//! whether the node is a leaf, and the state produced for it by its parent.
//! It answers with a [`Directive`]: continue into the children with a new
//! state, or abandon the rest of the subtree and resume at an ancestor depth.
//! Values handed to the [`Emitter`] reach the consumer in traversal order.

use crate::concurrency::handoff::{self, Fallible, HandoffSender};
use crate::concurrency::{CancelToken, Canceller, Enumeration};
use crate::config::PowersetConfig;
use crate::error::PowersetError;
use crate::tree::{Directive, Fork, Path, Visitor, WalkSummary, Walker};
use tracing::{debug, trace};

/// Destination for values produced by a decision function
pub struct Emitter<'a, R> {
    sink: Sink<'a, R>,
    emitted: u64,
}

enum Sink<'a, R> {
    Collect(&'a mut Vec<R>),
    Handoff(&'a HandoffSender<Fallible<R>>),
}

impl<'a, R> Emitter<'a, R> {
    fn new(sink: Sink<'a, R>) -> Self {
        Self { sink, emitted: 0 }
    }

    /// Hand `value` to the consumer, blocking until it is accepted
    ///
    /// Fails with `Cancelled` once the consumer has cancelled; propagate it
    /// with `?` so the traversal stops promptly.
    pub fn emit(&mut self, value: R) -> Result<(), PowersetError> {
        match &mut self.sink {
            Sink::Collect(results) => results.push(value),
            Sink::Handoff(out) => out.send(Ok(value))?,
        }
        self.emitted += 1;
        Ok(())
    }

    /// Values emitted so far in this traversal
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// Adapts a decision function to the walker
struct DecisionVisitor<'a, S, R, F> {
    decide: F,
    emitter: Emitter<'a, R>,
    token: Option<CancelToken>,
    _state: std::marker::PhantomData<fn(S) -> S>,
}

impl<'a, S, R, F> Visitor for DecisionVisitor<'a, S, R, F>
where
    S: Fork,
    F: FnMut(&Path, bool, S, &mut Emitter<'_, R>) -> Result<Directive<S>, PowersetError>,
{
    type State = S;

    fn visit(
        &mut self,
        path: &Path,
        is_leaf: bool,
        state: S,
    ) -> Result<Directive<S>, PowersetError> {
        if self.token.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(PowersetError::Cancelled);
        }

        let directive = (self.decide)(path, is_leaf, state, &mut self.emitter)?;
        if let Directive::Backtrack(level) = &directive {
            trace!(path = %path, resume = %level, "Decision function requested backtrack");
        }
        Ok(directive)
    }
}

/// Start a backtracking traversal over `items` items on a producer thread
///
/// `decide` is called as `decide(path, is_leaf, state, emitter)` exactly once
/// for every visited node. The returned enumeration yields emitted values in
/// traversal order and closes when the root's exploration has finished or was
/// terminated. An error returned by `decide` becomes the stream's final item.
///
/// Each emit blocks until the consumer has taken the value, so `decide` is
/// not called again before then.
pub fn callback<S, R, F>(items: usize, initial: S, decide: F) -> Result<Enumeration<R>, PowersetError>
where
    S: Fork + Send + 'static,
    R: Send + 'static,
    F: FnMut(&Path, bool, S, &mut Emitter<'_, R>) -> Result<Directive<S>, PowersetError>
        + Send
        + 'static,
{
    start(&PowersetConfig::default(), items, initial, decide)
}

pub(crate) fn start<S, R, F>(
    config: &PowersetConfig,
    items: usize,
    initial: S,
    decide: F,
) -> Result<Enumeration<R>, PowersetError>
where
    S: Fork + Send + 'static,
    R: Send + 'static,
    F: FnMut(&Path, bool, S, &mut Emitter<'_, R>) -> Result<Directive<S>, PowersetError>
        + Send
        + 'static,
{
    config.check_items(items)?;

    let token = CancelToken::new();
    let (out, receiver) = handoff::handoff(config.handoff_capacity, token.clone());
    let canceller = Canceller::new(token.clone());

    let stage = handoff::spawn_stage(config, "callback", out, move |out| {
        let mut visitor = DecisionVisitor {
            decide,
            emitter: Emitter::new(Sink::Handoff(out)),
            token: Some(token),
            _state: std::marker::PhantomData,
        };
        let summary = Walker::new(items).walk(&mut visitor, initial)?;
        log_summary(items, &summary, visitor.emitter.emitted());
        Ok(())
    })?;
    canceller.adopt(stage);

    Ok(Enumeration::new(receiver, canceller))
}

/// Run a backtracking traversal on the calling thread and collect every emitted value
///
/// Ordering and termination match [`callback`].
pub fn collect<S, R, F>(items: usize, initial: S, decide: F) -> Result<Vec<R>, PowersetError>
where
    S: Fork,
    F: FnMut(&Path, bool, S, &mut Emitter<'_, R>) -> Result<Directive<S>, PowersetError>,
{
    collect_with_summary(&PowersetConfig::default(), items, initial, decide).map(|(results, _)| results)
}

/// Like [`collect`], also reporting walk counters
pub fn collect_with_summary<S, R, F>(
    config: &PowersetConfig,
    items: usize,
    initial: S,
    decide: F,
) -> Result<(Vec<R>, WalkSummary), PowersetError>
where
    S: Fork,
    F: FnMut(&Path, bool, S, &mut Emitter<'_, R>) -> Result<Directive<S>, PowersetError>,
{
    config.check_items(items)?;

    let mut results = Vec::new();
    let (summary, emitted) = {
        let mut visitor = DecisionVisitor {
            decide,
            emitter: Emitter::new(Sink::Collect(&mut results)),
            token: None,
            _state: std::marker::PhantomData,
        };
        let summary = Walker::new(items).walk(&mut visitor, initial)?;
        (summary, visitor.emitter.emitted())
    };
    log_summary(items, &summary, emitted);
    Ok((results, summary))
}

fn log_summary(items: usize, summary: &WalkSummary, emitted: u64) {
    debug!(
        items,
        visited = summary.visited,
        pruned = summary.pruned,
        terminated = summary.terminated,
        emitted,
        "Backtracking traversal finished"
    );
}
