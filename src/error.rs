//! Error types for wsframe.

use thiserror::Error;

/// Main error type for all frame operations.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Masked encoding was requested but the OS random source failed.
    #[error("Randomness unavailable for masking key: {0}")]
    RandomnessUnavailable(#[from] getrandom::Error),

    /// Input ends before the bytes the frame header declares.
    #[error("Truncated frame: need {needed} bytes, have {available}")]
    TruncatedFrame {
        /// Bytes required to finish the current part of the frame,
        /// saturated at `u64::MAX`.
        needed: u64,
        /// Bytes actually present in the input.
        available: usize,
    },

    /// Declared payload length cannot be buffered on this platform.
    #[error("Payload length {0} exceeds addressable memory")]
    LengthOverflow(u64),

    /// I/O error on the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the stream in the middle of a frame.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using FrameError.
pub type Result<T> = std::result::Result<T, FrameError>;
