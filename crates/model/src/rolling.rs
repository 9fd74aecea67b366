//! Rolling-window factor-model estimation.

use eventcar_math::{MathError, ordinary_least_squares};
use eventcar_primitives::{Date, FactorLoadings, FactorTable, N_FACTORS};
use eventcar_traits::{EstimatorError, WindowEstimator};
use eventcar_utils::inner_join_dates;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ModelError, ReturnSeries};

/// Configuration for the rolling factor model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingConfig {
    /// Trailing window length in trading days.
    pub window: usize,
    /// Usable observations a window needs before it is fitted.
    pub min_observations: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self { window: 252, min_observations: 252 }
    }
}

impl RollingConfig {
    /// Check the window against the number of regressors.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if a window could never be fitted.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.min_observations < N_FACTORS {
            return Err(ModelError::InvalidConfig(format!(
                "min_observations {} is below the {N_FACTORS} regressors",
                self.min_observations
            )));
        }
        if self.min_observations > self.window {
            return Err(ModelError::InvalidConfig(format!(
                "min_observations {} exceeds window {}",
                self.min_observations, self.window
            )));
        }
        Ok(())
    }
}

/// Excess return and factor values for one trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedObservation {
    /// Trading date.
    pub date: Date,
    /// Usable return minus the risk-free rate, in percent.
    pub excess_return: Option<f64>,
    /// Factor values in regression column order.
    pub factors: [f64; N_FACTORS],
}

/// Inner join a return series with the factor table.
///
/// Trading days without a factor row are dropped.
///
/// # Errors
/// Returns `ModelError::Utils` if either input has repeated or unsorted dates.
pub fn align_with_factors(
    series: &ReturnSeries,
    factors: &FactorTable,
) -> Result<Vec<AlignedObservation>, ModelError> {
    let joined =
        inner_join_dates(series.observations(), |o| o.date, factors.rows(), |f| f.date)?;

    let dropped = series.len() - joined.len();
    if dropped > 0 {
        debug!(entity_id = %series.entity_id, dropped, "trading days without factor data");
    }

    Ok(joined
        .into_iter()
        .map(|(ret, fac)| AlignedObservation {
            date: ret.date,
            excess_return: ret.usable_return().map(|r| r - fac.risk_free),
            factors: fac.factors(),
        })
        .collect())
}

/// Configuration for [`OlsWindowEstimator`].
#[derive(Debug, Clone)]
pub struct OlsConfig {
    /// Fewer observations than this fail the window.
    pub min_observations: usize,
}

impl Default for OlsConfig {
    fn default() -> Self {
        Self { min_observations: N_FACTORS }
    }
}

/// Ordinary least squares without an intercept.
#[derive(Debug, Clone, Default)]
pub struct OlsWindowEstimator {
    config: OlsConfig,
}

impl WindowEstimator for OlsWindowEstimator {
    type Config = OlsConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn estimate_window(
        &self,
        y: &Array1<f64>,
        x: &Array2<f64>,
    ) -> Result<Array1<f64>, EstimatorError> {
        if y.len() < self.config.min_observations {
            return Err(EstimatorError::InsufficientData {
                required: self.config.min_observations,
                actual: y.len(),
            });
        }
        if x.nrows() != y.len() {
            return Err(EstimatorError::DimensionMismatch {
                expected: y.len(),
                actual: x.nrows(),
                context: "factor rows".to_string(),
            });
        }

        ordinary_least_squares(y, x).map(|fit| fit.coefficients).map_err(|e| match e {
            MathError::Underdetermined { observations, unknowns } => {
                EstimatorError::InsufficientData { required: unknowns, actual: observations }
            }
            e if e.is_degenerate() => EstimatorError::Degenerate(e.to_string()),
            e => EstimatorError::InvalidConfig(e.to_string()),
        })
    }
}

/// Loadings fitted on the window ending at `date`, if that window was usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingFit {
    /// Last date of the window.
    pub date: Date,
    /// Fitted loadings; `None` during warmup or for a degenerate window.
    pub loadings: Option<FactorLoadings>,
}

/// Rolling regression of excess return on the factor set.
///
/// Every date is fitted independently on the trailing `window` rows ending
/// at that date; nothing is carried between windows.
#[derive(Debug, Clone)]
pub struct RollingFactorModel<E = OlsWindowEstimator> {
    config: RollingConfig,
    estimator: E,
}

impl RollingFactorModel {
    /// Create a model with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RollingConfig::default())
    }

    /// Create an OLS model with custom configuration.
    #[must_use]
    pub fn with_config(config: RollingConfig) -> Self {
        let estimator =
            OlsWindowEstimator::with_config(OlsConfig { min_observations: config.min_observations });
        Self { config, estimator }
    }
}

impl Default for RollingFactorModel {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: WindowEstimator> RollingFactorModel<E> {
    /// Create a model around a custom window estimator.
    pub const fn with_estimator(config: RollingConfig, estimator: E) -> Self {
        Self { config, estimator }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Fit every date of `rows`.
    ///
    /// Returns one entry per input row, in order. The first `window - 1`
    /// rows never have loadings.
    #[must_use]
    pub fn fit(&self, rows: &[AlignedObservation]) -> Vec<RollingFit> {
        let window = self.config.window;
        let mut degenerate = 0_usize;

        let fits: Vec<RollingFit> = rows
            .iter()
            .enumerate()
            .map(|(t, row)| {
                let loadings = if t + 1 < window {
                    None
                } else {
                    match self.fit_window(&rows[t + 1 - window..=t]) {
                        Ok(loadings) => Some(loadings),
                        Err(EstimatorError::InsufficientData { .. }) => None,
                        Err(err) => {
                            degenerate += 1;
                            debug!(date = %row.date, error = %err, "window fit unavailable");
                            None
                        }
                    }
                };
                RollingFit { date: row.date, loadings }
            })
            .collect();

        if degenerate > 0 {
            debug!(degenerate, "degenerate regression windows");
        }
        fits
    }

    fn fit_window(&self, window: &[AlignedObservation]) -> Result<FactorLoadings, EstimatorError> {
        let usable: Vec<(f64, &[f64; N_FACTORS])> =
            window.iter().filter_map(|r| r.excess_return.map(|y| (y, &r.factors))).collect();

        let y: Array1<f64> = usable.iter().map(|(y, _)| *y).collect();
        let mut x = Array2::zeros((usable.len(), N_FACTORS));
        for (i, (_, factors)) in usable.iter().enumerate() {
            for (j, value) in factors.iter().enumerate() {
                x[[i, j]] = *value;
            }
        }

        let coefficients = self.estimator.estimate_window(&y, &x)?;
        if coefficients.len() != N_FACTORS {
            return Err(EstimatorError::DimensionMismatch {
                expected: N_FACTORS,
                actual: coefficients.len(),
                context: "loadings".to_string(),
            });
        }
        let mut loadings = [0.0; N_FACTORS];
        for (slot, value) in loadings.iter_mut().zip(coefficients.iter()) {
            *slot = *value;
        }
        Ok(FactorLoadings(loadings))
    }
}
