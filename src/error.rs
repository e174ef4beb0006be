//! Error types for Wiresight

use std::io;
use thiserror::Error;

/// Result type for Wiresight operations
pub type Result<T> = std::result::Result<T, WiresightError>;

/// Errors that can occur in Wiresight
#[derive(Debug, Error)]
pub enum WiresightError {
    /// Inspection requested on a module that is not one of the two shared
    /// client module singletons
    #[error("module must be the shared http or https client module")]
    InvalidModule,

    /// Request could not be constructed (bad URI, invalid header, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection-level failure from the underlying client, passed through
    /// unchanged
    #[error("Transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// Protocol or body-stream failure, passed through unchanged
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
