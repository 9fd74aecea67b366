//! Error types for the abnormal-return pipeline.

use eventcar_math::MathError;
use eventcar_primitives::{EntityId, EventId};
use eventcar_traits::{EstimatorError, ProviderError};
use eventcar_utils::UtilsError;

/// Errors that can occur while building returns, fitting the factor model or
/// aggregating event windows.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Price history too short relative to the rolling window.
    #[error("insufficient history for {entity}: need {required} observations, got {actual}")]
    InsufficientHistory {
        /// Entity.
        entity: EntityId,
        /// Required number of observations.
        required: usize,
        /// Usable observations found.
        actual: usize,
    },

    /// A regression window could not be solved.
    #[error("degenerate regression: {0}")]
    RegressionDegeneracy(String),

    /// Event hour falls outside every alignment bucket.
    #[error("event {event_id} at hour {hour} has no window alignment")]
    UnalignedEventTime {
        /// Event.
        event_id: EventId,
        /// Exchange-local hour of the event.
        hour: u32,
    },

    /// No persisted series for the entity an event refers to.
    #[error("no persisted series for entity {0}")]
    MissingArtifact(EntityId),

    /// Provider or store error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Estimator error.
    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Series alignment error.
    #[error("alignment error: {0}")]
    Utils(#[from] UtilsError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Returns whether the unit of work should be skipped and the batch continued.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientHistory { .. }
            | Self::RegressionDegeneracy(_)
            | Self::UnalignedEventTime { .. }
            | Self::MissingArtifact(_) => true,
            Self::Provider(err) => err.is_no_data(),
            _ => false,
        }
    }
}
