//! Daily prices from Yahoo Finance.

use std::time::Duration;

use chrono::{DateTime, NaiveTime};
use eventcar_primitives::{Date, EntityId, PriceObservation};
use tokio::time::sleep;
use tracing::debug;
use yahoo_finance_api as yahoo;

use crate::{DataError, Result};

/// Yahoo Finance price fetcher with rate limiting.
pub struct YahooPriceFetcher {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooPriceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceFetcher")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooPriceFetcher {
    /// Create a fetcher with default rate limiting (1 req/sec).
    ///
    /// # Errors
    /// Returns `DataError::YahooApi` if the connector cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a fetcher with custom rate limiting.
    ///
    /// # Errors
    /// Returns `DataError::YahooApi` if the connector cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self { provider: yahoo::YahooConnector::new()?, rate_limit_delay })
    }

    /// Fetch daily prices of `symbol`, recorded under `entity`.
    ///
    /// The adjustment factor is `adjclose / close`, so adjusted opens follow
    /// the same dividend adjustment as closes.
    ///
    /// # Errors
    /// Returns `DataError::MissingData` if Yahoo returns no quotes, or a
    /// network/API error.
    pub async fn fetch(
        &self,
        symbol: &str,
        entity: EntityId,
        start: Date,
        end: Date,
    ) -> Result<Vec<PriceObservation>> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let start_time = to_offset(start, NaiveTime::MIN)?;
        let day_end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        let end_time = to_offset(end, day_end)?;

        let response = self.provider.get_quote_history(symbol, start_time, end_time).await?;
        let quotes = response.quotes().map_err(|e| DataError::YahooApi(e.to_string()))?;
        if quotes.is_empty() {
            return Err(DataError::MissingData {
                key: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let mut prices = Vec::with_capacity(quotes.len());
        for q in &quotes {
            let date = DateTime::from_timestamp(q.timestamp as i64, 0)
                .ok_or_else(|| DataError::TimeConversion(format!("timestamp {}", q.timestamp)))?
                .date_naive();
            let factor = (q.close != 0.0).then(|| q.adjclose / q.close);
            prices.push(PriceObservation {
                entity_id: entity,
                date,
                open: Some(q.open),
                close: Some(q.close),
                adjusted_close: Some(q.adjclose),
                adjustment_factor: factor,
            });
        }
        debug!(symbol, entity_id = %entity, rows = prices.len(), "quotes fetched");

        sleep(self.rate_limit_delay).await;
        Ok(prices)
    }
}

fn to_offset(date: Date, at: NaiveTime) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(at).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}
