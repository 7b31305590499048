use thiserror::Error;

/// Errors raised synchronously by metric construction, updates and computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// A constructor or call received an argument it cannot accept.
    #[error("{0}")]
    InvalidArgument(String),

    /// The input conflicts with how the metric was configured, e.g. a `nan` under the error policy.
    #[error("{0}")]
    InvalidState(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },
}

impl MetricError {
    pub(crate) fn dimension_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
