//! Error types for SwarmTrack.

use thiserror::Error;

/// Main error type for SwarmTrack operations.
#[derive(Error, Debug)]
pub enum SwarmTrackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Frame {frame} is outside the tracked range {first}..={last}")]
    FrameOutOfRange { frame: usize, first: usize, last: usize },
}

/// Result type alias for SwarmTrack operations.
pub type Result<T> = std::result::Result<T, SwarmTrackError>;
