//! Decision records and the path from a tree node back to the root

use std::fmt;

/// One edge of the decision tree: whether item `index` is in the candidate set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    pub index: usize,
    pub included: bool,
}

impl Decision {
    pub fn new(index: usize, included: bool) -> Self {
        Self { index, included }
    }

    pub fn excluded(index: usize) -> Self {
        Self::new(index, false)
    }

    pub fn included(index: usize) -> Self {
        Self::new(index, true)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.included { '+' } else { '-' };
        write!(f, "{}:{}", self.index, sign)
    }
}

/// Ordered decisions identifying a node of the decision tree
///
/// Public accessors present the most recent decision first and the decision
/// closest to the root last, so `path.get(0)` is the edge that led to the
/// current node. Storage is root-first so the walker can push and pop in O(1).
/// The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    decisions: Vec<Decision>,
}

impl Path {
    /// The root path
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            decisions: Vec::with_capacity(capacity),
        }
    }

    /// Build a path from decisions listed most-recent-first
    pub fn from_recent_first(decisions: impl IntoIterator<Item = Decision>) -> Self {
        let mut decisions: Vec<Decision> = decisions.into_iter().collect();
        decisions.reverse();
        Self { decisions }
    }

    pub(crate) fn push(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub(crate) fn pop(&mut self) -> Option<Decision> {
        self.decisions.pop()
    }

    /// Depth of the node this path identifies (root = 0)
    pub fn depth(&self) -> usize {
        self.decisions.len()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.decisions.is_empty()
    }

    /// The `i`-th decision counting from the most recent one
    pub fn get(&self, i: usize) -> Option<&Decision> {
        let len = self.decisions.len();
        if i >= len {
            return None;
        }
        self.decisions.get(len - 1 - i)
    }

    /// The decision that led to this node, `None` at the root
    pub fn first(&self) -> Option<&Decision> {
        self.decisions.last()
    }

    /// Decisions from the most recent back to the root
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Decision> + ExactSizeIterator + '_ {
        self.decisions.iter().rev()
    }

    /// Included item indices, most recently decided first
    pub fn included_indices(&self) -> Vec<usize> {
        self.iter()
            .filter(|decision| decision.included)
            .map(|decision| decision.index)
            .collect()
    }

    /// Membership vector of length `n`; position `i` is true iff item `i` is included
    pub fn to_mask(&self, n: usize) -> Vec<bool> {
        let mut mask = vec![false; n];
        for decision in self.decisions.iter().filter(|d| d.included) {
            if let Some(slot) = mask.get_mut(decision.index) {
                *slot = true;
            }
        }
        mask
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("{}");
        }
        for (i, decision) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", decision)?;
        }
        Ok(())
    }
}

/// Structural equality of two paths: same length, same decisions in order
pub fn validate_path(path: &Path, check: &Path) -> bool {
    path.len() == check.len() && path.iter().zip(check.iter()).all(|(a, b)| a == b)
}
