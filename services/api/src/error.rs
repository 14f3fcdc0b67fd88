//! services/api/src/error.rs
//!
//! Errors that can stop the study service before it starts serving. Once the
//! server is up, failures are reported to the client panel by panel instead.

use crate::config::ConfigError;
use quran_study_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment did not describe a usable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A port failed while the service was being assembled.
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    /// The shared HTTP client for the content API could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup failed: {0}")]
    Internal(String),
}
