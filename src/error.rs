use thiserror::Error;

/// Errors raised at construction time.
///
/// Parsing itself is best-effort and never fails on malformed fragments;
/// only contract violations surface here.
#[derive(Debug, Error)]
pub enum LyricSyncError {
    /// A line carried a negative start time or duration.
    #[error("invalid lyric line: {reason}")]
    InvalidLine { reason: String },

    /// The player was configured with a non-positive tick interval.
    #[error("tick interval must be greater than zero, got {millis}ms")]
    InvalidTickInterval { millis: i64 },
}

pub type Result<T> = std::result::Result<T, LyricSyncError>;
