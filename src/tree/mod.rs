//! Binary decision tree over `n` items
//!
//! Each node of the tree is identified by the path of include/exclude
//! decisions that leads to it from the root; the leaves are the members of
//! the powerset.

pub mod fork;
pub mod path;
pub mod walker;

pub use fork::Fork;
pub use path::{validate_path, Decision, Path};
pub use walker::{Directive, ResumeLevel, Visitor, WalkSummary, Walker};
