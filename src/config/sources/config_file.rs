//! Explicit TOML config file source.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{File, FileFormat};
use std::path::Path;
use tracing::warn;

/// Add the config file at `path` to the builder.
/// A missing file is reported and skipped; a malformed one fails the build.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        warn!(config_path = %path.display(), "Configuration file not found, using defaults");
        return Ok(builder);
    }

    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}
