//! Powerset Walk: lazy powerset enumeration with backtracking control
//!
//! Enumerates the subsets of `n` indexed items by walking a binary decision
//! tree in a fixed order, excluded child before included child. Results are
//! produced on a background thread and consumed lazily through a bounded,
//! cancelable [`Enumeration`]. The callback protocol lets a decision function
//! prune whole subtrees mid-walk, which makes it usable as the search engine
//! behind backtracking algorithms.

pub mod api;
pub mod backtrack;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod tree;

pub use api::Powerset;
pub use backtrack::{callback, Emitter};
pub use concurrency::{Canceller, Enumeration};
pub use error::PowersetError;
pub use pipeline::{fixed_size, variable_size};
pub use tree::{validate_path, Decision, Directive, Fork, Path, ResumeLevel, WalkSummary};

/// The same operations run to completion on the calling thread
pub mod eager {
    pub use crate::backtrack::collect as callback;
    pub use crate::pipeline::{collect_fixed as fixed_size, collect_variable as variable_size};
}
