//! Shared setup for commands that touch textures.

use std::path::Path;

use ddsforge::config::ConfigFile;
use ddsforge::logging::{init_logging, LoggingGuard};
use ddsforge::TextureConverter;
use tracing::info;

use crate::error::CliError;

/// Loaded config, active logging and the converter used by a command.
pub struct CliRunner {
    config: ConfigFile,
    converter: TextureConverter,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the config file and start logging.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let filter = if verbose { "debug" } else { "info" };
        let logging = init_logging(&config.logging.directory, &config.logging.file, filter)
            .map_err(CliError::Logging)?;

        Ok(Self {
            config,
            converter: TextureConverter::default(),
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn converter(&self) -> &TextureConverter {
        &self.converter
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            codec = self.converter.codec().name(),
            log = %Path::new(&self.config.logging.directory)
                .join(&self.config.logging.file)
                .display(),
            "ddsforge starting"
        );
    }
}
