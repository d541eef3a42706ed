//! Configured entry point for every enumeration operation

use crate::backtrack::{self, Emitter};
use crate::concurrency::Enumeration;
use crate::config::PowersetConfig;
use crate::error::PowersetError;
use crate::pipeline;
use crate::tree::{Directive, Fork, Path, WalkSummary};

/// Powerset enumerator bound to a validated configuration
#[derive(Debug, Clone, Default)]
pub struct Powerset {
    config: PowersetConfig,
}

impl Powerset {
    pub fn new(config: PowersetConfig) -> Result<Self, PowersetError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PowersetError::Config(error_msgs.join("\n"))
        })?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PowersetConfig {
        &self.config
    }

    /// Lazily enumerate membership vectors; see [`pipeline::fixed_size`]
    pub fn fixed_size(&self, items: usize) -> Result<Enumeration<Vec<bool>>, PowersetError> {
        pipeline::start_fixed(&self.config, items)
    }

    /// Lazily enumerate included-index lists; see [`pipeline::variable_size`]
    pub fn variable_size(&self, items: usize) -> Result<Enumeration<Vec<usize>>, PowersetError> {
        pipeline::start_variable(&self.config, items)
    }

    /// Start a backtracking traversal; see [`backtrack::callback`]
    pub fn callback<S, R, F>(
        &self,
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
        backtrack::start(&self.config, items, initial, decide)
    }

    /// Every membership vector, collected on the calling thread
    pub fn collect_fixed(&self, items: usize) -> Result<Vec<Vec<bool>>, PowersetError> {
        pipeline::collect_leaves(&self.config, items, |path| path.to_mask(items))
    }

    /// Every included-index list, collected on the calling thread
    pub fn collect_variable(&self, items: usize) -> Result<Vec<Vec<usize>>, PowersetError> {
        pipeline::collect_leaves(&self.config, items, Path::included_indices)
    }

    /// Run a backtracking traversal on the calling thread
    pub fn collect_callback<S, R, F>(
        &self,
        items: usize,
        initial: S,
        decide: F,
    ) -> Result<(Vec<R>, WalkSummary), PowersetError>
    where
        S: Fork,
        F: FnMut(&Path, bool, S, &mut Emitter<'_, R>) -> Result<Directive<S>, PowersetError>,
    {
        backtrack::collect_with_summary(&self.config, items, initial, decide)
    }
}
