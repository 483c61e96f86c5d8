//! Common error types for TagSense

use std::path::PathBuf;

use thiserror::Error;

/// Common result type for TagSense operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by TagSense crates
#[derive(Error, Debug)]
pub enum Error {
    /// File could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration resolution or parse error
    #[error("Configuration error: {0}")]
    Config(String),
}
