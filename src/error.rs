use std::io;

use thiserror::Error;

/// Connection-level failures. These are the only conditions that end a
/// decode call; protocol faults are reported as [`FrameFault`] values.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("serial connection is not open")]
    ConnectionNotOpen,
    #[error("serial connection closed: {0}")]
    ConnectionClosed(#[from] io::Error),
    #[error("read cancelled by stop signal")]
    Cancelled,
}

impl DecodeError {
    pub fn closed(reason: &str) -> Self {
        Self::ConnectionClosed(io::Error::new(io::ErrorKind::UnexpectedEof, reason.to_string()))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Recoverable protocol faults. The read loop keeps going after each of these.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameFault {
    /// A marker byte was followed by another marker or by EOF.
    StreamTruncated { marker: u8, next: u8 },
    /// Unconsumed samples crossed the overflow limit under low-value noise.
    BufferOverflow { discarded: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("config validation error: {0}")]
    Validation(String),
}
