//! Common error types for the DAT recovery tools

use thiserror::Error;

/// Common result type for DAT recovery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the frame pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame read returned fewer than the fixed frame size of bytes.
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// Internal track bookkeeping violated (a bug, not an input condition).
    #[error("invalid track state: {0}")]
    TrackState(String),

    /// The triple-merge divergence abort condition fired.
    #[error(
        "tape images unaligned or badly damaged: \
         {uncorrected} uncorrected errors in {frames} frames"
    )]
    Misaligned { uncorrected: u64, frames: u64 },
}
