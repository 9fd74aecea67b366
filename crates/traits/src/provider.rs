//! Data provider trait definitions.

use eventcar_primitives::{Date, EntityId, FactorTable, PriceObservation, TradingCalendar};

/// Errors returned by data providers and artifact stores.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The source answered but holds nothing for the request.
    #[error("no data for {key}")]
    NoData {
        /// What was requested.
        key: String,
    },

    /// The source could not be reached or failed temporarily.
    #[error("transient failure for {key}: {reason}")]
    Transient {
        /// What was requested.
        key: String,
        /// Underlying cause.
        reason: String,
    },

    /// The request or the returned payload is malformed.
    #[error("malformed data for {key}: {reason}")]
    Malformed {
        /// What was requested.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Shorthand for [`ProviderError::NoData`].
    pub fn no_data(key: impl Into<String>) -> Self {
        Self::NoData { key: key.into() }
    }

    /// Shorthand for [`ProviderError::Transient`].
    pub fn transient(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transient { key: key.into(), reason: reason.to_string() }
    }

    /// Shorthand for [`ProviderError::Malformed`].
    pub fn malformed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed { key: key.into(), reason: reason.to_string() }
    }

    /// Whether the caller should skip this unit of work and carry on.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

/// Supplies the ordered set of valid trading dates.
pub trait TradingCalendarProvider {
    /// Trading days within `[start, end]`.
    ///
    /// # Errors
    /// Returns `ProviderError` if the calendar cannot be read.
    fn trading_days(&self, start: Date, end: Date) -> Result<TradingCalendar, ProviderError>;
}

/// Supplies daily dividend-adjusted prices for one entity.
pub trait PriceSeriesProvider {
    /// Price observations for `entity` within `[start, end]`, in any order.
    ///
    /// # Errors
    /// Returns `ProviderError::NoData` when the entity has no prices.
    fn prices(
        &self,
        entity: EntityId,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceObservation>, ProviderError>;
}

/// Supplies the daily factor table.
pub trait FactorTableProvider {
    /// The complete factor table.
    ///
    /// # Errors
    /// Returns `ProviderError` if the table cannot be loaded or parsed.
    fn factor_table(&self) -> Result<FactorTable, ProviderError>;
}

/// Loads a raw table (CSV text) by key.
///
/// Implementations stack: a disk cache can wrap a network source.
pub trait TableLoader {
    /// Load the table stored under `key`.
    ///
    /// # Errors
    /// Returns `ProviderError` if neither the cache nor the source can serve the key.
    fn load(&self, key: &str) -> Result<String, ProviderError>;
}

impl<T: TableLoader + ?Sized> TableLoader for &T {
    fn load(&self, key: &str) -> Result<String, ProviderError> {
        (**self).load(key)
    }
}
