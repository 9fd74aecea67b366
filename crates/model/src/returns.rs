//! Calendar-aligned daily return series.

use eventcar_primitives::{Date, EntityId, PriceObservation, ReturnObservation, TradingCalendar};
use eventcar_utils::{forward_fill, left_join_dates, pct_change};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ModelError;

/// Configuration for the return series builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnSeriesConfig {
    /// A day's return is usable only if the previous close was at least this.
    pub min_price: f64,
    /// Length of the rolling regression window the series will feed.
    pub rolling_window: usize,
    /// Required price history as a multiple of `rolling_window`.
    pub history_multiple: f64,
}

impl Default for ReturnSeriesConfig {
    fn default() -> Self {
        Self { min_price: 1.0, rolling_window: 252, history_multiple: 1.5 }
    }
}

impl ReturnSeriesConfig {
    /// Minimum number of usable price observations.
    #[must_use]
    pub fn min_history(&self) -> usize {
        (self.rolling_window as f64 * self.history_multiple).ceil() as usize
    }
}

/// Daily returns of one entity on every trading day of its price history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    /// Entity.
    pub entity_id: EntityId,
    observations: Vec<ReturnObservation>,
}

impl ReturnSeries {
    /// Observations in ascending date order, one per trading day.
    #[must_use]
    pub fn observations(&self) -> &[ReturnObservation] {
        &self.observations
    }

    /// Number of trading days.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Builds calendar-aligned simple returns from a sparse price history.
#[derive(Debug, Clone, Default)]
pub struct ReturnSeriesBuilder {
    config: ReturnSeriesConfig,
}

impl ReturnSeriesBuilder {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReturnSeriesConfig::default())
    }

    /// Create a builder with custom configuration.
    #[must_use]
    pub const fn with_config(config: ReturnSeriesConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReturnSeriesConfig {
        &self.config
    }

    /// Build the return series of `entity`.
    ///
    /// Prices may arrive unsorted and with duplicate dates (the last one wins).
    /// Rows without a close or adjusted close are discarded. The validity
    /// flag of each observed day is taken from the previous observed close,
    /// before the series is joined onto the calendar; gap days keep a
    /// missing flag even though their adjusted close is forward filled.
    ///
    /// # Errors
    /// Returns `ModelError::InsufficientHistory` when fewer than
    /// [`ReturnSeriesConfig::min_history`] usable prices remain.
    pub fn build(
        &self,
        entity: EntityId,
        prices: &[PriceObservation],
        calendar: &TradingCalendar,
    ) -> Result<ReturnSeries, ModelError> {
        let observed = sorted_unique(prices.iter().filter(|p| p.has_closes()).cloned());

        let required = self.config.min_history();
        if observed.len() < required {
            return Err(ModelError::InsufficientHistory {
                entity,
                required,
                actual: observed.len(),
            });
        }

        let flagged: Vec<FlaggedClose> = observed
            .iter()
            .enumerate()
            .map(|(i, p)| FlaggedClose {
                date: p.date,
                adjusted_close: p.adjusted_close,
                valid: i
                    .checked_sub(1)
                    .and_then(|prev| observed[prev].close)
                    .map(|prev_close| prev_close >= self.config.min_price),
            })
            .collect();

        let (first, last) = match (observed.first(), observed.last()) {
            (Some(f), Some(l)) => (f.date, l.date),
            _ => return Err(ModelError::InsufficientHistory { entity, required, actual: 0 }),
        };
        let axis = calendar.between(first, last);
        let joined = left_join_dates(axis.days(), &flagged, |f| f.date)?;

        let gaps = joined.iter().filter(|(_, row)| row.is_none()).count();
        if gaps > 0 {
            debug!(entity_id = %entity, gaps, "price gaps on trading days");
        }

        let raw: Vec<Option<f64>> =
            joined.iter().map(|(_, row)| row.and_then(|r| r.adjusted_close)).collect();
        let closes = forward_fill(&raw);
        let returns = pct_change(&closes);

        let observations = joined
            .iter()
            .zip(closes)
            .zip(returns)
            .map(|(((date, row), close), ret)| ReturnObservation {
                date: *date,
                close,
                simple_return: ret.map(|r| r * 100.0),
                valid: row.and_then(|r| r.valid),
            })
            .collect();

        Ok(ReturnSeries { entity_id: entity, observations })
    }
}

#[derive(Debug, Clone, Copy)]
struct FlaggedClose {
    date: Date,
    adjusted_close: Option<f64>,
    valid: Option<bool>,
}

/// Sort prices by date, keeping the last observation for any repeated date.
pub(crate) fn sorted_unique(
    prices: impl IntoIterator<Item = PriceObservation>,
) -> Vec<PriceObservation> {
    let mut rows: Vec<PriceObservation> = prices.into_iter().collect();
    rows.sort_by_key(|p| p.date);
    let mut out: Vec<PriceObservation> = Vec::with_capacity(rows.len());
    for row in rows {
        match out.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => out.push(row),
        }
    }
    out
}
