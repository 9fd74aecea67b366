//! Return type definitions.

use serde::{Deserialize, Serialize};

use crate::{Date, EntityId};

/// One calendar-aligned day of an entity's return series.
///
/// Gap days (no price on a trading day) carry a forward-filled close, and a
/// `valid` flag of `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnObservation {
    /// Trading date.
    pub date: Date,
    /// Dividend-adjusted close, forward filled across gaps.
    pub close: Option<f64>,
    /// Simple return in percent versus the previous calendar day.
    pub simple_return: Option<f64>,
    /// Whether the previous observed close cleared the minimum price floor.
    pub valid: Option<bool>,
}

impl ReturnObservation {
    /// The return, only when the day is flagged valid.
    #[must_use]
    pub fn usable_return(&self) -> Option<f64> {
        match self.valid {
            Some(true) => self.simple_return.filter(|r| r.is_finite()),
            _ => None,
        }
    }
}

/// Realized versus factor-model return for one entity-day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbnormalReturnObservation {
    /// Entity.
    pub entity_id: EntityId,
    /// Trading date.
    pub date: Date,
    /// Return in excess of the risk-free rate; absent on unusable days.
    pub realized_excess_return: Option<f64>,
    /// Factor-model prediction of the excess return.
    pub fitted_return: f64,
    /// Realized minus fitted.
    pub abnormal_return: Option<f64>,
}

impl AbnormalReturnObservation {
    /// Build an observation, deriving the abnormal return.
    #[must_use]
    pub fn new(
        entity_id: EntityId,
        date: Date,
        realized_excess_return: Option<f64>,
        fitted_return: f64,
    ) -> Self {
        Self {
            entity_id,
            date,
            realized_excess_return,
            fitted_return,
            abnormal_return: realized_excess_return.map(|r| r - fitted_return),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_return_requires_valid_flag() {
        let date = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let mut obs =
            ReturnObservation { date, close: Some(10.0), simple_return: Some(1.5), valid: None };
        assert_eq!(obs.usable_return(), None);
        obs.valid = Some(false);
        assert_eq!(obs.usable_return(), None);
        obs.valid = Some(true);
        assert_eq!(obs.usable_return(), Some(1.5));
    }

    #[test]
    fn abnormal_is_realized_minus_fitted() {
        let date = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let obs = AbnormalReturnObservation::new(EntityId::new(7), date, Some(1.25), 0.75);
        assert_eq!(obs.abnormal_return, Some(0.5));

        let gap = AbnormalReturnObservation::new(EntityId::new(7), date, None, 0.75);
        assert_eq!(gap.abnormal_return, None);
    }
}
