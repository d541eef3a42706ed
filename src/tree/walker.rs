//! Recursive walker over the binary decision tree
//!
//! Level `i` of the tree decides item `i`. Every internal node offers its
//! excluded child before its included child; leaves sit at depth `n`. A visitor
//! may abandon the current subtree with a [`Directive::Backtrack`], naming the
//! ancestor depth at which exploration resumes.

use crate::error::PowersetError;
use crate::tree::fork::Fork;
use crate::tree::path::{Decision, Path};
use std::fmt;
use tracing::{debug, trace};

/// Ancestor depth at which exploration resumes after a subtree is abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResumeLevel {
    /// Unwind past the root: the whole traversal ends
    BeforeRoot,
    /// Resume with the unexplored sibling branch of the frame at this depth
    Depth(usize),
}

impl ResumeLevel {
    /// Classic one-step backtracking from a node at `depth`
    pub fn parent_of(depth: usize) -> Self {
        match depth.checked_sub(1) {
            Some(parent) => ResumeLevel::Depth(parent),
            None => ResumeLevel::BeforeRoot,
        }
    }

    /// Whether the frame at `depth` must keep unwinding rather than resume
    pub fn is_above(self, depth: usize) -> bool {
        match self {
            ResumeLevel::BeforeRoot => true,
            ResumeLevel::Depth(level) => depth > level,
        }
    }

    /// Signed form: -1 for before-root, otherwise the depth
    pub fn as_i64(self) -> i64 {
        match self {
            ResumeLevel::BeforeRoot => -1,
            ResumeLevel::Depth(level) => level as i64,
        }
    }
}

impl TryFrom<i64> for ResumeLevel {
    type Error = PowersetError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            -1 => Ok(ResumeLevel::BeforeRoot),
            l if l >= 0 => usize::try_from(l)
                .map(ResumeLevel::Depth)
                .map_err(|e| PowersetError::InvalidArgument(format!("resume level {}: {}", l, e))),
            l => Err(PowersetError::InvalidArgument(format!(
                "resume level {} is below -1",
                l
            ))),
        }
    }
}

impl fmt::Display for ResumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// What the walker does after visiting a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<S> {
    /// Explore the node's children, each starting from its own copy of this state
    Continue(S),
    /// Abandon the rest of this subtree and resume at the given ancestor depth
    Backtrack(ResumeLevel),
}

impl<S> Directive<S> {
    /// Abandon this subtree and let the parent try its next branch
    pub fn backtrack_from(path: &Path) -> Self {
        Directive::Backtrack(ResumeLevel::parent_of(path.depth()))
    }

    /// End the whole traversal
    pub fn terminate() -> Self {
        Directive::Backtrack(ResumeLevel::BeforeRoot)
    }
}

/// Called once for every node the walker reaches, in tree order
pub trait Visitor {
    type State: Fork;

    fn visit(
        &mut self,
        path: &Path,
        is_leaf: bool,
        state: Self::State,
    ) -> Result<Directive<Self::State>, PowersetError>;
}

/// Counters reported at the end of a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Visitor invocations
    pub visited: u64,
    /// Directives that abandoned a subtree
    pub pruned: u64,
    /// Unwinding escaped past the root
    pub terminated: bool,
}

/// Number of nodes in the full decision tree over `items` items, saturating
pub fn node_count(items: usize) -> u64 {
    u32::try_from(items + 1)
        .ok()
        .and_then(|exp| 2u64.checked_pow(exp))
        .map(|total| total - 1)
        .unwrap_or(u64::MAX)
}

/// Number of leaves (powerset members) over `items` items, saturating
pub fn leaf_count(items: usize) -> u64 {
    u32::try_from(items)
        .ok()
        .and_then(|exp| 2u64.checked_pow(exp))
        .unwrap_or(u64::MAX)
}

/// Depth-first walker over the decision tree of a fixed item count
#[derive(Debug, Clone, Copy)]
pub struct Walker {
    items: usize,
}

enum Unwind {
    Finished,
    Unwinding(ResumeLevel),
}

struct Frame<'v, V: Visitor> {
    items: usize,
    path: Path,
    visitor: &'v mut V,
    summary: WalkSummary,
}

impl Walker {
    pub fn new(items: usize) -> Self {
        Self { items }
    }

    /// Visit the tree from the root, threading `initial` down to every child
    pub fn walk<V: Visitor>(
        &self,
        visitor: &mut V,
        initial: V::State,
    ) -> Result<WalkSummary, PowersetError> {
        debug!(items = self.items, "Starting decision tree walk");

        let mut frame = Frame {
            items: self.items,
            path: Path::with_capacity(self.items),
            visitor,
            summary: WalkSummary::default(),
        };
        let outcome = frame.descend(initial)?;
        frame.summary.terminated = matches!(outcome, Unwind::Unwinding(_));

        debug!(
            items = self.items,
            visited = frame.summary.visited,
            pruned = frame.summary.pruned,
            terminated = frame.summary.terminated,
            "Finished decision tree walk"
        );
        Ok(frame.summary)
    }
}

impl<V: Visitor> Frame<'_, V> {
    fn descend(&mut self, state: V::State) -> Result<Unwind, PowersetError> {
        let depth = self.path.depth();
        let is_leaf = depth == self.items;

        self.summary.visited += 1;
        trace!(path = %self.path, is_leaf, "Visiting node");

        let state = match self.visitor.visit(&self.path, is_leaf, state)? {
            Directive::Continue(state) => state,
            Directive::Backtrack(level) => {
                if let ResumeLevel::Depth(requested) = level {
                    if requested > depth {
                        return Err(PowersetError::InvalidResumeLevel {
                            requested: level,
                            depth,
                        });
                    }
                }
                self.summary.pruned += 1;
                trace!(path = %self.path, resume = %level, "Abandoning subtree");
                return Ok(Unwind::Unwinding(level));
            }
        };

        if is_leaf {
            return Ok(Unwind::Finished);
        }

        let sibling_state = state.fork();
        if let Unwind::Unwinding(level) = self.child(Decision::excluded(depth), sibling_state)? {
            if level.is_above(depth) {
                return Ok(Unwind::Unwinding(level));
            }
            trace!(depth, "Resuming with included branch");
        }

        match self.child(Decision::included(depth), state)? {
            Unwind::Unwinding(level) if level.is_above(depth) => Ok(Unwind::Unwinding(level)),
            _ => Ok(Unwind::Finished),
        }
    }

    fn child(&mut self, decision: Decision, state: V::State) -> Result<Unwind, PowersetError> {
        self.path.push(decision);
        let outcome = self.descend(state);
        self.path.pop();
        outcome
    }
}
