//! Benchmark-adjusted forward returns after an event.

use chrono::Timelike;
use eventcar_math::{compound_index, ordinary_least_squares};
use eventcar_primitives::{
    Date, EarningsEvent, EntityId, EventForwardReturn, ForwardHorizonReturn,
    ForwardReturnObservation, PriceObservation, TradingCalendar,
};
use eventcar_traits::{ArtifactStore, PriceSeriesProvider};
use eventcar_utils::{inner_join_dates, next_change};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    ComputeOutcome, ExchangeClock, ModelError, SkipReason, WindowStart,
    batch::{ArtifactMemo, unique_events},
    returns::sorted_unique,
};

/// Configuration for forward returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardReturnConfig {
    /// Rows of pre-event history used to estimate beta.
    pub beta_window: usize,
    /// Entities with at most this many joined rows are skipped.
    pub min_history: usize,
    /// Holding periods in trading days.
    pub horizons: Vec<usize>,
    /// Events before this local hour trade open-to-open from the event day.
    pub premarket_cutoff_hour: u32,
    /// First local hour of the intraday (close-to-close) bucket.
    pub intraday_start_hour: u32,
    /// Local hour the intraday bucket ends, exclusive.
    pub intraday_end_hour: u32,
    /// Events at or after this local hour trade open-to-open from the next day.
    pub close_hour: u32,
}

impl Default for ForwardReturnConfig {
    fn default() -> Self {
        Self {
            beta_window: 252,
            min_history: 252,
            horizons: vec![1, 2, 3, 4, 5, 10, 22],
            premarket_cutoff_hour: 9,
            intraday_start_hour: 10,
            intraday_end_hour: 15,
            close_hour: 16,
        }
    }
}

/// Which price the holding period is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBasis {
    /// Open to open.
    Open,
    /// Close to close.
    Close,
}

/// Builds next-day entity and benchmark returns.
#[derive(Debug, Clone, Default)]
pub struct ForwardReturnBuilder {
    config: ForwardReturnConfig,
}

impl ForwardReturnBuilder {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with custom configuration.
    #[must_use]
    pub const fn with_config(config: ForwardReturnConfig) -> Self {
        Self { config }
    }

    /// Forward returns of `entity` against `benchmark`, on the dates both traded.
    ///
    /// # Errors
    /// Returns `ModelError::InsufficientHistory` when the joined series has
    /// `min_history` rows or fewer.
    pub fn build(
        &self,
        entity: EntityId,
        prices: &[PriceObservation],
        benchmark: &[PriceObservation],
    ) -> Result<Vec<ForwardReturnObservation>, ModelError> {
        let prices = sorted_unique(prices.iter().cloned());
        let benchmark = sorted_unique(benchmark.iter().cloned());
        let joined = inner_join_dates(&prices, |p| p.date, &benchmark, |b| b.date)?;

        if joined.len() <= self.config.min_history {
            return Err(ModelError::InsufficientHistory {
                entity,
                required: self.config.min_history + 1,
                actual: joined.len(),
            });
        }

        let entity_open = forward_changes(&joined, |p, _| p.adjusted_open());
        let entity_close = forward_changes(&joined, |p, _| p.adjusted_close);
        let bench_open = forward_changes(&joined, |_, b| b.adjusted_open());
        let bench_close = forward_changes(&joined, |_, b| b.adjusted_close);

        Ok(joined
            .iter()
            .enumerate()
            .map(|(i, (p, _))| ForwardReturnObservation {
                entity_id: entity,
                date: p.date,
                entity_open_return: entity_open[i],
                entity_close_return: entity_close[i],
                benchmark_open_return: bench_open[i],
                benchmark_close_return: bench_close[i],
            })
            .collect())
    }

    /// Build and persist the series of `entity` unless it is already stored.
    ///
    /// # Errors
    /// Returns `ModelError` for provider or store failures.
    pub fn build_and_store<P, S>(
        &self,
        entity: EntityId,
        prices: &P,
        benchmark: &[PriceObservation],
        range: (Date, Date),
        store: &S,
    ) -> Result<ComputeOutcome, ModelError>
    where
        P: PriceSeriesProvider + ?Sized,
        S: ArtifactStore<ForwardReturnObservation> + ?Sized,
    {
        if store.exists(entity) {
            info!(entity_id = %entity, "forward returns already stored, skipping");
            return Ok(ComputeOutcome::Skipped(SkipReason::ArtifactExists));
        }

        let history = match prices.prices(entity, range.0, range.1) {
            Ok(history) => history,
            Err(err) if err.is_no_data() => {
                info!(entity_id = %entity, "no price data, skipping");
                return Ok(ComputeOutcome::Skipped(SkipReason::NoData));
            }
            Err(err) => return Err(err.into()),
        };

        let rows = match self.build(entity, &history, benchmark) {
            Ok(rows) => rows,
            Err(ModelError::InsufficientHistory { required, actual, .. }) => {
                info!(entity_id = %entity, required, actual, "price history too short, skipping");
                return Ok(ComputeOutcome::Skipped(SkipReason::InsufficientHistory));
            }
            Err(err) => return Err(err),
        };

        store.write(entity, &rows)?;
        info!(entity_id = %entity, rows = rows.len(), "forward returns stored");
        Ok(ComputeOutcome::Written { rows: rows.len() })
    }
}

fn forward_changes(
    joined: &[(&PriceObservation, &PriceObservation)],
    price: impl Fn(&PriceObservation, &PriceObservation) -> Option<f64>,
) -> Vec<Option<f64>> {
    let levels: Vec<Option<f64>> = joined.iter().map(|&(p, b)| price(p, b)).collect();
    next_change(&levels)
}

/// Beta-adjusted forward returns over configured horizons after each event.
#[derive(Debug, Clone, Default)]
pub struct EventForwardAggregator {
    config: ForwardReturnConfig,
    clock: ExchangeClock,
}

impl EventForwardAggregator {
    /// Create an aggregator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator with custom configuration and exchange clock.
    #[must_use]
    pub const fn with_config(config: ForwardReturnConfig, clock: ExchangeClock) -> Self {
        Self { config, clock }
    }

    /// Window start and return basis for an event.
    ///
    /// # Errors
    /// Returns `ModelError::UnalignedEventTime` for hours outside every bucket.
    pub fn align(&self, event: &EarningsEvent) -> Result<(WindowStart, ReturnBasis), ModelError> {
        let local = self.clock.local(&event.timestamp);
        let (day, hour) = (local.date(), local.hour());
        let c = &self.config;

        if hour < c.premarket_cutoff_hour {
            Ok((WindowStart::OnOrAfter(day), ReturnBasis::Open))
        } else if hour >= c.close_hour {
            Ok((WindowStart::After(day), ReturnBasis::Open))
        } else if (c.intraday_start_hour..c.intraday_end_hour).contains(&hour) {
            Ok((WindowStart::OnOrAfter(day), ReturnBasis::Close))
        } else {
            Err(ModelError::UnalignedEventTime { event_id: event.event_id.clone(), hour })
        }
    }

    /// Slope of entity on benchmark close returns over the trailing window
    /// before `day`, or 1.0 if that regression is unavailable.
    #[must_use]
    pub fn beta(&self, series: &[ForwardReturnObservation], day: Date) -> f64 {
        let end = series.partition_point(|r| r.date < day);
        let start = end.saturating_sub(self.config.beta_window);
        let pairs: Vec<(f64, f64)> = series[start..end]
            .iter()
            .filter_map(|r| Some((r.entity_close_return?, r.benchmark_close_return?)))
            .filter(|(y, x)| y.is_finite() && x.is_finite())
            .collect();

        if pairs.len() < self.config.beta_window {
            debug!(rows = pairs.len(), "short beta history, using 1.0");
            return 1.0;
        }

        let y: Array1<f64> = pairs.iter().map(|(y, _)| *y).collect();
        let mut x = Array2::ones((pairs.len(), 2));
        for (i, (_, bench)) in pairs.iter().enumerate() {
            x[[i, 0]] = *bench;
        }
        match ordinary_least_squares(&y, &x) {
            Ok(fit) => fit.coefficients[0],
            Err(err) => {
                debug!(error = %err, "beta regression failed, using 1.0");
                1.0
            }
        }
    }

    /// Forward returns of one event from the entity's series.
    ///
    /// Horizons are `None` when the series has no row for the calendar's
    /// first trading day of the window.
    ///
    /// # Errors
    /// Returns `ModelError::UnalignedEventTime` if the event cannot be aligned.
    pub fn aggregate_one(
        &self,
        event: &EarningsEvent,
        series: &[ForwardReturnObservation],
        calendar: &TradingCalendar,
    ) -> Result<EventForwardReturn, ModelError> {
        let (start, basis) = self.align(event)?;
        let beta = self.beta(series, self.clock.local(&event.timestamp).date());

        let window = start.rows(series, calendar, |r| r.date);
        let span = self.config.horizons.iter().copied().max().unwrap_or(0);
        let (entity, bench): (Vec<Option<f64>>, Vec<Option<f64>>) = window
            .iter()
            .take(span)
            .map(|r| match basis {
                ReturnBasis::Open => (r.entity_open_return, r.benchmark_open_return),
                ReturnBasis::Close => (r.entity_close_return, r.benchmark_close_return),
            })
            .unzip();
        let entity_index = compound_index(&entity, 1.0);
        let bench_index = compound_index(&bench, 1.0);

        let horizons = self
            .config
            .horizons
            .iter()
            .map(|&days| {
                let value = days.checked_sub(1).and_then(|k| match (entity.get(k), bench.get(k)) {
                    (Some(Some(_)), Some(Some(_))) => {
                        Some((entity_index[k] - 1.0) - beta * (bench_index[k] - 1.0))
                    }
                    _ => None,
                });
                ForwardHorizonReturn { days, value }
            })
            .collect();

        Ok(EventForwardReturn {
            event_id: event.event_id.clone(),
            entity_id: event.entity_id,
            beta,
            horizons,
        })
    }

    /// Forward returns for every event, in input order.
    ///
    /// Window starts are resolved against `calendar` and each entity's
    /// series is read at most once. Events without a stored series, or that
    /// cannot be aligned, produce no row; repeated ids keep the first.
    ///
    /// # Errors
    /// Returns `ModelError` if the store fails for a reason other than a
    /// missing artifact.
    pub fn aggregate<S>(
        &self,
        events: &[EarningsEvent],
        calendar: &TradingCalendar,
        store: &S,
    ) -> Result<Vec<EventForwardReturn>, ModelError>
    where
        S: ArtifactStore<ForwardReturnObservation> + ?Sized,
    {
        let mut memo = ArtifactMemo::new(store);
        let mut results = Vec::with_capacity(events.len());

        for event in unique_events(events) {
            let Some(series) = memo.get(event.entity_id)? else {
                let err = ModelError::MissingArtifact(event.entity_id);
                info!(event_id = %event.event_id, error = %err, "skipping event");
                continue;
            };
            match self.aggregate_one(event, series, calendar) {
                Ok(result) => results.push(result),
                Err(err) if err.is_recoverable() => {
                    warn!(event_id = %event.event_id, error = %err, "skipping event");
                }
                Err(err) => return Err(err),
            }
        }

        info!(events = events.len(), rows = results.len(), "event forward returns aggregated");
        Ok(results)
    }
}
