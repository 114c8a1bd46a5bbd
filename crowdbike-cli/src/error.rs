//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use crowdbike::config::ConfigFileError;
use crowdbike::sampling::SamplingError;
use crowdbike::storage::StorageError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// `init` would overwrite an existing config file
    ConfigExists(PathBuf),
    /// Failed to prepare the data log
    Storage(StorageError),
    /// The sampling session ended with an error
    Sampling(SamplingError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to install the Ctrl-C handler
    SignalHandler(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::NotFound(_)) => {
                eprintln!();
                eprintln!("Create one with:");
                eprintln!("  crowdbike init --bike-nr <NR> --name <NAME> --data-dir <DIR>");
                eprintln!("or point to an existing file with --config <PATH>.");
            }
            CliError::Storage(_) | CliError::Sampling(SamplingError::Persist { .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. logfile_path in [user] is not writable by this user");
                eprintln!("  2. The SD card or USB stick is full or was removed");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::ConfigExists(path) => write!(
                f,
                "Config file '{}' already exists (use --force to overwrite)",
                path.display()
            ),
            CliError::Storage(e) => write!(f, "Failed to prepare data log: {}", e),
            CliError::Sampling(e) => write!(f, "Sampling stopped: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Storage(e) => Some(e),
            CliError::Sampling(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Storage(e)
    }
}

impl From<SamplingError> for CliError {
    fn from(e: SamplingError) -> Self {
        CliError::Sampling(e)
    }
}
