//! CLI runner for common setup.
//!
//! Encapsulates config loading and logging initialization so command
//! handlers start from a validated configuration.

use std::path::{Path, PathBuf};

use crowdbike::config::{default_config_path, ConfigFile};
use crowdbike::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Resolve `--config`, falling back to `config.ini` in the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(default_config_path)
}

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load the config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path given with `--config`, if any
    /// * `debug_mode` - When true, enables debug-level logging unless RUST_LOG is set
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = self::config_path(config_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard =
            init_logging(&config.logging.directory, &config.logging.file, debug_mode)
                .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("crowdbike v{}", crowdbike::VERSION);
        info!(
            config = %self.config_path.display(),
            log = %self.logging_guard.path().display(),
            "crowdbike CLI: {} command",
            command
        );
    }
}
