//! Error type shared by the codec, the stream combinators and the CLI commands.

use std::io;
use thiserror::Error;

/// Errors that can occur while encoding, decoding or querying count streams.
#[derive(Error, Debug)]
pub enum CountsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `next_transition()` was called on an exhausted stream.
    #[error("No more transitions in stream")]
    NoMoreTransitions,

    /// `next_peak()` was called with no pending peak.
    #[error("No more elements")]
    NoMoreElements,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Corrupt byte stream. Decoding stops at the first bad record.
    #[error("Malformed encoding at byte {offset}: {message}")]
    MalformedEncoding { offset: usize, message: String },

    #[error("Invalid run: {0}")]
    InvalidRun(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl CountsError {
    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        CountsError::MalformedEncoding {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CountsError>;
