//! Error types for the detection filter.

use thiserror::Error;

/// Result type alias for fallible filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Fatal errors surfaced to the caller before any frame is processed.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl FilterError {
    pub(crate) fn invalid_config<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Reason a raw detection was rejected.
///
/// These never leave the engine as errors: the detection is dropped and the
/// reason is logged at debug level.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidDetection {
    #[error("malformed box {0:?}: expected finite x_min < x_max and y_min < y_max")]
    MalformedBox([f32; 4]),

    #[error("score {0} outside [0, 1]")]
    ScoreOutOfRange(f32),

    #[error("normalized box {0:?} outside [0, 1]")]
    NormalizedOutOfRange([f32; 4]),

    #[error("invalid frame size {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("timestamp {0} is not finite")]
    InvalidTimestamp(f64),

    #[error("detection belongs to frame {detection} but frame {expected} is being processed")]
    FrameMismatch { expected: u64, detection: u64 },
}
