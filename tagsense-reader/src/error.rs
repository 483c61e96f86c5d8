//! Error types for tagsense-reader
//!
//! Device faults are recoverable (the session substitutes the fallback
//! source); caller input faults are rejected before any state is touched.

use thiserror::Error;

use crate::reader::ReaderCode;

/// Main error type for tagsense-reader
#[derive(Error, Debug)]
pub enum Error {
    /// Reader returned a non-zero status code
    #[error("Reader {operation} failed: {code}")]
    Device {
        operation: &'static str,
        code: ReaderCode,
    },

    /// Invalid caller input (threshold, page size, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound notification errors
    #[error("Notification error: {0}")]
    Notification(#[from] reqwest::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Errors surfaced from tagsense-common
    #[error(transparent)]
    Common(#[from] tagsense_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for faults the polling cycle recovers from by falling back
    pub fn is_device_fault(&self) -> bool {
        matches!(self, Error::Device { .. })
    }
}

/// Convenience Result type using tagsense-reader Error
pub type Result<T> = std::result::Result<T, Error>;
