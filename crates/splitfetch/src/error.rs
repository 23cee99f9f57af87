//! Error types for splitfetch.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timeout")]
    Timeout,

    #[error("HTTP error {status} from {url}")]
    Status { status: u16, url: String },

    #[error("range {requested} not honored (status {status})")]
    RangeNotSatisfied { status: u16, requested: String },

    #[error("stream ended early: expected {expected} bytes, received {received}")]
    PrematureEof { expected: u64, received: u64 },

    #[error("part starting at {start} gave up at offset {position} after {attempts} attempts: {source}")]
    RetriesExhausted {
        start: u64,
        position: u64,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("output sink error: {0}")]
    Sink(#[source] io::Error),

    #[error("part task failed: {0}")]
    Join(String),

    #[error("download incomplete: {complete} of {total} parts finished")]
    Incomplete { complete: usize, total: usize },
}

impl Error {
    /// Returns `true` if the failure may go away by re-issuing the request.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout | Error::PrematureEof { .. } => true,
            Error::Status { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Returns `true` if the output sink is no longer usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Sink(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
