//! Error types for the display protocol.
//!
//! Hard failures surface to the caller as [`DisplayError`]. Rendering never
//! fails: unorderable keys and over-budget containers degrade in place.

use thiserror::Error;

/// Errors surfaced by the encoder, framer and figure adapter.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// A display operation ran before `setup()` created the display state.
    #[error("display state not initialized: call setup() before displaying figures")]
    SetupOrder,

    /// The encoded payload would exceed the configured byte budget.
    #[error("Blob size exceeds limit of {limit} bytes")]
    Oversize { limit: usize },

    /// The window-size configuration string could not be parsed.
    #[error("Error in resizing: {message}")]
    Configuration { message: String },

    /// Vector markup was not valid UTF-8.
    #[error("vector markup is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Writing to the output stream or a destination file failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DisplayError>;
