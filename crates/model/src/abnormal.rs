//! Abnormal returns against the rolling factor model.

use eventcar_primitives::{
    AbnormalReturnObservation, Date, EntityId, FactorTable, PriceObservation, TradingCalendar,
};
use eventcar_traits::{ArtifactStore, PriceSeriesProvider};
use tracing::{info, warn};

use crate::{
    AlignedObservation, ComputeOutcome, ModelError, ReturnSeriesBuilder, ReturnSeriesConfig,
    RollingConfig, RollingFactorModel, RollingFit, SkipReason, align_with_factors,
};

/// Combine realized excess returns with rolling fits.
///
/// Rows without loadings are dropped. A row whose realized return is
/// unusable is kept with a missing abnormal return.
#[must_use]
pub fn abnormal_returns(
    entity: EntityId,
    rows: &[AlignedObservation],
    fits: &[RollingFit],
) -> Vec<AbnormalReturnObservation> {
    rows.iter()
        .zip(fits)
        .filter_map(|(row, fit)| {
            debug_assert_eq!(row.date, fit.date);
            let fitted = fit.loadings?.fitted(&row.factors);
            Some(AbnormalReturnObservation::new(entity, row.date, row.excess_return, fitted))
        })
        .collect()
}

/// Price history to abnormal-return series for one entity.
#[derive(Debug, Clone, Default)]
pub struct AbnormalReturnModel {
    returns: ReturnSeriesBuilder,
    rolling: RollingFactorModel,
}

impl AbnormalReturnModel {
    /// Create a model with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model with custom configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the rolling configuration is
    /// unusable or the history guard refers to a different window.
    pub fn with_config(
        returns: ReturnSeriesConfig,
        rolling: RollingConfig,
    ) -> Result<Self, ModelError> {
        rolling.validate()?;
        if returns.rolling_window != rolling.window {
            return Err(ModelError::InvalidConfig(format!(
                "history guard window {} differs from rolling window {}",
                returns.rolling_window, rolling.window
            )));
        }
        Ok(Self {
            returns: ReturnSeriesBuilder::with_config(returns),
            rolling: RollingFactorModel::with_config(rolling),
        })
    }

    /// Compute the abnormal-return series of `entity`.
    ///
    /// # Errors
    /// Returns `ModelError::InsufficientHistory` for short price histories,
    /// or an alignment error for malformed inputs.
    pub fn compute(
        &self,
        entity: EntityId,
        prices: &[PriceObservation],
        calendar: &TradingCalendar,
        factors: &FactorTable,
    ) -> Result<Vec<AbnormalReturnObservation>, ModelError> {
        let series = self.returns.build(entity, prices, calendar)?;
        let aligned = align_with_factors(&series, factors)?;
        let fits = self.rolling.fit(&aligned);
        Ok(abnormal_returns(entity, &aligned, &fits))
    }

    /// Compute and persist the series of `entity` unless it is already stored.
    ///
    /// Entities without price data or with a short history are skipped, not
    /// failed; the outcome says which.
    ///
    /// # Errors
    /// Returns `ModelError` for provider, store or alignment failures.
    pub fn compute_and_store<P, S>(
        &self,
        entity: EntityId,
        inputs: &EntityInputs<'_, P>,
        store: &S,
    ) -> Result<ComputeOutcome, ModelError>
    where
        P: PriceSeriesProvider + ?Sized,
        S: ArtifactStore<AbnormalReturnObservation> + ?Sized,
    {
        if store.exists(entity) {
            info!(entity_id = %entity, "abnormal returns already stored, skipping");
            return Ok(ComputeOutcome::Skipped(SkipReason::ArtifactExists));
        }

        let prices = match inputs.prices.prices(entity, inputs.start, inputs.end) {
            Ok(prices) => prices,
            Err(err) if err.is_no_data() => {
                info!(entity_id = %entity, "no price data, skipping");
                return Ok(ComputeOutcome::Skipped(SkipReason::NoData));
            }
            Err(err) => return Err(err.into()),
        };

        let rows = match self.compute(entity, &prices, inputs.calendar, inputs.factors) {
            Ok(rows) => rows,
            Err(ModelError::InsufficientHistory { required, actual, .. }) => {
                info!(entity_id = %entity, required, actual, "price history too short, skipping");
                return Ok(ComputeOutcome::Skipped(SkipReason::InsufficientHistory));
            }
            Err(err) => return Err(err),
        };

        if rows.is_empty() {
            warn!(entity_id = %entity, "no fitted dates, storing empty series");
        }
        store.write(entity, &rows)?;
        info!(entity_id = %entity, rows = rows.len(), "abnormal returns stored");
        Ok(ComputeOutcome::Written { rows: rows.len() })
    }
}

/// Shared inputs of a per-entity computation.
#[derive(Debug, Clone, Copy)]
pub struct EntityInputs<'a, P: ?Sized> {
    /// Price source.
    pub prices: &'a P,
    /// Trading calendar covering the date range.
    pub calendar: &'a TradingCalendar,
    /// Factor table.
    pub factors: &'a FactorTable,
    /// First requested date.
    pub start: Date,
    /// Last requested date.
    pub end: Date,
}
