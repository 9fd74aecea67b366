//! Exchange-local event times.

use std::str::FromStr;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use eventcar_primitives::EventTimestamp;

use crate::ModelError;

/// Converts event timestamps to the exchange's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeClock {
    tz: Tz,
}

impl Default for ExchangeClock {
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York)
    }
}

impl ExchangeClock {
    /// Create a clock for a time zone.
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Create a clock from an IANA zone name such as `America/New_York`.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for an unknown zone.
    pub fn from_name(name: &str) -> Result<Self, ModelError> {
        Tz::from_str(name)
            .map(Self::new)
            .map_err(|e| ModelError::InvalidConfig(format!("time zone {name}: {e}")))
    }

    /// Wall-clock time of `timestamp` at the exchange.
    #[must_use]
    pub fn local(&self, timestamp: &EventTimestamp) -> NaiveDateTime {
        match timestamp {
            EventTimestamp::Local(at) => *at,
            EventTimestamp::Utc(at) => at.with_timezone(&self.tz).naive_local(),
        }
    }
}
