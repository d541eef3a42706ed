//! Configuration System
//!
//! Runtime settings for traversal producers: the item-count ceiling, the
//! handoff capacity and how producer threads are spawned. Values are layered
//! as defaults, then an optional TOML file, then `POWERSET_` environment
//! variables.

use crate::error::PowersetError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod config_file;
    pub mod environment;
}

pub const DEFAULT_HANDOFF_CAPACITY: usize = 1;
pub const DEFAULT_THREAD_NAME: &str = "powerset-walk";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowersetConfig {
    /// Largest item count a traversal accepts (unbounded when unset)
    #[serde(default)]
    pub max_items: Option<usize>,

    /// Slots in each producer/consumer handoff; a producer runs at most
    /// `handoff_capacity - 1` values ahead of its consumer
    #[serde(default = "default_handoff_capacity")]
    pub handoff_capacity: usize,

    /// Name prefix for producer threads
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// Stack size for producer threads in bytes (platform default when unset)
    #[serde(default)]
    pub stack_size: Option<usize>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_handoff_capacity() -> usize {
    DEFAULT_HANDOFF_CAPACITY
}

fn default_thread_name() -> String {
    DEFAULT_THREAD_NAME.to_string()
}

impl Default for PowersetConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            handoff_capacity: default_handoff_capacity(),
            thread_name: default_thread_name(),
            stack_size: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Traversal(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Traversal(msg) => write!(f, "Traversal: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PowersetConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.handoff_capacity == 0 {
            errors.push(ValidationError::Traversal(
                "handoff_capacity must be at least 1".to_string(),
            ));
        }
        if self.thread_name.is_empty() || self.thread_name.contains('\0') {
            errors.push(ValidationError::Traversal(
                "thread_name must be non-empty and free of NUL bytes".to_string(),
            ));
        }
        if self.stack_size == Some(0) {
            errors.push(ValidationError::Traversal(
                "stack_size must be positive when set".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Reject item counts above the ceiling, if one is configured
    pub fn check_items(&self, items: usize) -> Result<(), PowersetError> {
        match self.max_items {
            Some(max_items) if items > max_items => Err(PowersetError::InvalidArgument(format!(
                "item count {} exceeds max_items {}",
                items, max_items
            ))),
            _ => Ok(()),
        }
    }
}

/// Builds a [`PowersetConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the optional file at `path`, then the process environment
    pub fn load(path: Option<&Path>) -> Result<PowersetConfig, PowersetError> {
        Self::load_with_env(path, None)
    }

    /// Like [`ConfigLoader::load`], reading variables from `vars` instead of the process
    pub fn load_with_env(
        path: Option<&Path>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<PowersetConfig, PowersetError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        if let Some(path) = path {
            builder = sources::config_file::add_to_builder(builder, path)?;
        }
        builder = sources::environment::add_to_builder(builder, vars);

        let config: PowersetConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PowersetError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        debug!(
            max_items = ?config.max_items,
            handoff_capacity = config.handoff_capacity,
            "Loaded configuration"
        );
        Ok(config)
    }
}
