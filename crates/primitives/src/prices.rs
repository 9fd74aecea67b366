//! Daily price observations.

use serde::{Deserialize, Serialize};

use crate::{Date, EntityId};

/// One trading day of prices for one entity.
///
/// A missing or zero close marks the observation unusable as the base of the
/// *following* day's return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Entity the prices belong to.
    pub entity_id: EntityId,
    /// Trading date.
    pub date: Date,
    /// Unadjusted open.
    pub open: Option<f64>,
    /// Unadjusted close.
    pub close: Option<f64>,
    /// Close adjusted retroactively for dividends.
    pub adjusted_close: Option<f64>,
    /// Multiplier turning an unadjusted price into a dividend-adjusted one.
    pub adjustment_factor: Option<f64>,
}

impl PriceObservation {
    /// Create an observation carrying only closes (open and factor unknown).
    #[must_use]
    pub const fn from_closes(
        entity_id: EntityId,
        date: Date,
        close: f64,
        adjusted_close: f64,
    ) -> Self {
        Self {
            entity_id,
            date,
            open: None,
            close: Some(close),
            adjusted_close: Some(adjusted_close),
            adjustment_factor: None,
        }
    }

    /// Dividend-adjusted open, when both the open and the factor are known.
    #[must_use]
    pub fn adjusted_open(&self) -> Option<f64> {
        match (self.open, self.adjustment_factor) {
            (Some(open), Some(factor)) => Some(open * factor),
            _ => None,
        }
    }

    /// Whether the record has the fields needed for return computation.
    #[must_use]
    pub fn has_closes(&self) -> bool {
        matches!((self.close, self.adjusted_close), (Some(c), Some(a)) if c.is_finite() && a.is_finite())
    }
}
