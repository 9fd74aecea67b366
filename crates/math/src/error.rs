//! Error types for mathematical operations.

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Fewer observations than unknowns.
    #[error("underdetermined system: {observations} observations for {unknowns} unknowns")]
    Underdetermined {
        /// Number of observations.
        observations: usize,
        /// Number of coefficients.
        unknowns: usize,
    },

    /// Matrix is singular or nearly singular.
    #[error("matrix is singular or nearly singular")]
    Singular,

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Numerical instability (NaN or Inf).
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

impl MathError {
    /// Whether the failure comes from the data rather than the caller.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(
            self,
            Self::Singular | Self::Underdetermined { .. } | Self::NumericalInstability(_)
        )
    }
}
