//! Window regression trait definitions.

use ndarray::{Array1, Array2};

/// Errors that can occur during estimation.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// Dimension mismatch in input data.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
        /// Context description.
        context: String,
    },

    /// Insufficient data for estimation.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// The design matrix cannot be inverted.
    #[error("degenerate design matrix: {0}")]
    Degenerate(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EstimatorError {
    /// Returns whether this error only invalidates the current window.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::Degenerate(_))
    }
}

/// A regression fitted independently on one window of observations.
pub trait WindowEstimator: Send + Sync {
    /// Configuration type for this estimator.
    type Config: Default + Clone + Send + Sync;

    /// Create a new estimator with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Fit `y` on the columns of `x` over one window.
    ///
    /// # Arguments
    /// * `y` - Response vector (n,)
    /// * `x` - Regressors (n x p)
    ///
    /// # Returns
    /// Coefficient vector (p,).
    ///
    /// # Errors
    /// Returns `EstimatorError` if dimensions mismatch or the window is degenerate.
    fn estimate_window(&self, y: &Array1<f64>, x: &Array2<f64>)
    -> Result<Array1<f64>, EstimatorError>;
}
