// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the target generators.

use std::fmt;

/// Result type alias for target generation.
pub type Result<T> = std::result::Result<T, TargetError>;

/// Main error type for the target generators.
///
/// Every variant is raised before any output is allocated, so a failed call
/// never leaves partially written targets behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The keypoint array's per-person joint count differs from the configured one.
    JointCountMismatch {
        /// Configured joint count.
        expected: usize,
        /// Joint count found in the keypoint array.
        actual: usize,
    },
    /// The area array is not aligned with the keypoint array's persons.
    AreaCountMismatch {
        /// Number of persons in the keypoint array.
        expected: usize,
        /// Number of areas supplied.
        actual: usize,
    },
    /// The keypoint records carry fewer fields than the generator reads.
    FieldCountMismatch {
        /// Minimum fields per joint record: 3 (x, y, v) or 4 (x, y, v, sigma).
        required: usize,
        /// Fields per joint record found in the keypoint array.
        actual: usize,
    },
    /// Invalid configuration provided.
    ConfigError(String),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JointCountMismatch { expected, actual } => write!(
                f,
                "Joint count mismatch: the number of joints should be {expected}, got {actual}"
            ),
            Self::AreaCountMismatch { expected, actual } => write!(
                f,
                "Area count mismatch: expected one area per person ({expected}), got {actual}"
            ),
            Self::FieldCountMismatch { required, actual } => write!(
                f,
                "Field count mismatch: joint records need at least {required} fields, got {actual}"
            ),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for TargetError {}
