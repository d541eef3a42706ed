//! Merge rules: defaults first, then file, then environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

use crate::config::{DEFAULT_HANDOFF_CAPACITY, DEFAULT_THREAD_NAME};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("handoff_capacity", DEFAULT_HANDOFF_CAPACITY as i64)?
        .set_default("thread_name", DEFAULT_THREAD_NAME)
}
