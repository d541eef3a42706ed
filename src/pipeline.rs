//! Lazy powerset enumeration pipelines
//!
//! Two stages run on their own threads. The walk stage visits the decision
//! tree and hands a copy of each leaf's path to the convert stage, which
//! shapes it into the public result and forwards it to the consumer. Each
//! handoff returns only once the value is taken, so the walk stage is at most
//! one leaf ahead of the consumer.

use crate::concurrency::handoff::{self, Fallible, HandoffSender};
use crate::concurrency::{CancelToken, Canceller, Enumeration};
use crate::config::PowersetConfig;
use crate::error::PowersetError;
use crate::tree::{Directive, Path, Visitor, Walker};
use tracing::debug;

/// Hands every leaf path to the next stage
struct LeafHandoff<'a> {
    out: &'a HandoffSender<Fallible<Path>>,
}

impl Visitor for LeafHandoff<'_> {
    type State = ();

    fn visit(&mut self, path: &Path, is_leaf: bool, _: ()) -> Result<Directive<()>, PowersetError> {
        if is_leaf {
            self.out.send(Ok(path.clone()))?;
        }
        Ok(Directive::Continue(()))
    }
}

/// Collects converted leaves on the calling thread
struct LeafCollector<T, C> {
    convert: C,
    results: Vec<T>,
}

impl<T, C: FnMut(&Path) -> T> Visitor for LeafCollector<T, C> {
    type State = ();

    fn visit(&mut self, path: &Path, is_leaf: bool, _: ()) -> Result<Directive<()>, PowersetError> {
        if is_leaf {
            self.results.push((self.convert)(path));
        }
        Ok(Directive::Continue(()))
    }
}

/// Every subset as a membership vector of length `items`, in tree order
///
/// For three items the order is `[F,F,F]`, `[F,F,T]`, `[F,T,F]`, ... `[T,T,T]`.
pub fn fixed_size(items: usize) -> Result<Enumeration<Vec<bool>>, PowersetError> {
    start_fixed(&PowersetConfig::default(), items)
}

/// Every subset as the list of included indices, in tree order
///
/// Indices within a subset are listed most recently decided first, so for
/// three items the order is `[]`, `[2]`, `[1]`, `[2,1]`, `[0]`, `[2,0]`, `[1,0]`, `[2,1,0]`.
pub fn variable_size(items: usize) -> Result<Enumeration<Vec<usize>>, PowersetError> {
    start_variable(&PowersetConfig::default(), items)
}

pub(crate) fn start_fixed(
    config: &PowersetConfig,
    items: usize,
) -> Result<Enumeration<Vec<bool>>, PowersetError> {
    start(config, items, move |path| path.to_mask(items))
}

pub(crate) fn start_variable(
    config: &PowersetConfig,
    items: usize,
) -> Result<Enumeration<Vec<usize>>, PowersetError> {
    start(config, items, Path::included_indices)
}

fn start<T, C>(config: &PowersetConfig, items: usize, convert: C) -> Result<Enumeration<T>, PowersetError>
where
    T: Send + 'static,
    C: Fn(&Path) -> T + Send + 'static,
{
    config.check_items(items)?;

    let token = CancelToken::new();
    let (paths_out, mut paths_in) = handoff::handoff(config.handoff_capacity, token.clone());
    let (results_out, receiver) = handoff::handoff(config.handoff_capacity, token.clone());
    let canceller = Canceller::new(token);

    let walk = handoff::spawn_stage(config, "walk", paths_out, move |out| {
        let summary = Walker::new(items).walk(&mut LeafHandoff { out }, ())?;
        debug!(items, leaves = summary.visited / 2 + 1, "Walk stage exhausted the tree");
        Ok(())
    })?;
    canceller.adopt(walk);

    let convert_stage = handoff::spawn_stage(config, "convert", results_out, move |out| {
        while let Some(leaf) = paths_in.blocking_recv() {
            out.send(leaf.map(|path| convert(&path)))?;
        }
        Ok(())
    });
    match convert_stage {
        Ok(handle) => canceller.adopt(handle),
        Err(err) => {
            canceller.cancel();
            return Err(err);
        }
    }

    Ok(Enumeration::new(receiver, canceller))
}

/// Collect every subset as a membership vector on the calling thread
pub fn collect_fixed(items: usize) -> Result<Vec<Vec<bool>>, PowersetError> {
    collect_leaves(&PowersetConfig::default(), items, |path| path.to_mask(items))
}

/// Collect every subset as included indices on the calling thread
pub fn collect_variable(items: usize) -> Result<Vec<Vec<usize>>, PowersetError> {
    collect_leaves(&PowersetConfig::default(), items, Path::included_indices)
}

pub(crate) fn collect_leaves<T>(
    config: &PowersetConfig,
    items: usize,
    convert: impl FnMut(&Path) -> T,
) -> Result<Vec<T>, PowersetError> {
    config.check_items(items)?;

    let mut collector = LeafCollector {
        convert,
        results: Vec::new(),
    };
    Walker::new(items).walk(&mut collector, ())?;
    Ok(collector.results)
}
