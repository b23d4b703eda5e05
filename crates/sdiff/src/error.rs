//! Error types for the diff engine.
//!
//! Every comparison error is fatal: the comparison that raised it is
//! abandoned and none of its differences are kept. Only genuine value
//! disagreements become [`Difference`](crate::Difference) records.

use std::fmt;

/// Errors that can occur while configuring or running a comparison.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The two values at a position have different declared types.
    #[error("type mismatch at {path}: {a} vs {b}")]
    TypeMismatch { path: String, a: String, b: String },

    /// Traversal went deeper than the configured limit.
    #[error("depth over limit {limit} at {path}")]
    DepthExceeded { path: String, limit: usize },

    /// One side of a comparison position has no value.
    #[error("invalid value at {path}: missing {type_name}")]
    InvalidValue { path: String, type_name: String },

    /// A dynamic value resolved to a kind the engine cannot compare.
    #[error("unsupported value at {path}: {type_name}")]
    UnsupportedValue { path: String, type_name: String },

    /// A comparator or sorter broke its contract.
    #[error("protocol violation at {path}: {reason}")]
    ProtocolViolation { path: String, reason: String },

    /// A path pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A rendering template does not have exactly three `{}` slots.
    #[error("invalid template {0:?}: expected exactly three {{}} placeholders")]
    InvalidTemplate(String),
}

impl DiffError {
    pub fn type_mismatch(path: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn protocol(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl PartialEq for DiffError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for DiffError {}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
