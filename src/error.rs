//! Error types for powerset enumeration and backtracking traversal.

use crate::tree::walker::ResumeLevel;
use thiserror::Error;

/// Errors raised by traversals, pipelines and their configuration
#[derive(Debug, Error)]
pub enum PowersetError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid resume level {requested} at depth {depth}: must be before-root or an ancestor depth in [0, {depth}]")]
    InvalidResumeLevel { requested: ResumeLevel, depth: usize },

    #[error("Decision function failed: {0}")]
    Decision(String),

    #[error("Traversal cancelled")]
    Cancelled,

    #[error("Producer panicked: {0}")]
    ProducerPanicked(String),

    #[error("Failed to spawn producer thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PowersetError {
    /// Whether this error only reports that the consumer went away
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PowersetError::Cancelled)
    }
}

impl From<config::ConfigError> for PowersetError {
    fn from(err: config::ConfigError) -> Self {
        PowersetError::Config(err.to_string())
    }
}
