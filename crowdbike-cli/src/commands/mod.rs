//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`check`] - Validate the configuration
//! - [`init`] - Configuration initialization
//! - [`run`] - Main command (sampling session)

pub mod check;
pub mod init;
pub mod run;
