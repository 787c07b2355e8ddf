//! Error types for the SGU-1 dispatcher.

use thiserror::Error;

/// Result type for dispatcher lifecycle operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors returned by configuration and lifecycle calls.
///
/// Steady-state paths (commands, ticks, rendering) never fail; out-of-range
/// arguments there are ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Custom chip clock outside the usable range.
    #[error("Invalid chip clock: {0} Hz")]
    InvalidClock(u32),

    /// Tuning reference is not a positive finite frequency.
    #[error("Invalid tuning: {0} Hz")]
    InvalidTuning(String),

    /// Channel index outside the chip.
    #[error("Channel {index} out of range (0..{available})")]
    InvalidChannel {
        /// Requested index.
        index: usize,
        /// Available channels.
        available: usize,
    },
}
