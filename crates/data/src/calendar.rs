//! Trading calendar sources.

use std::path::{Path, PathBuf};

use eventcar_primitives::{Date, TradingCalendar};
use eventcar_traits::{ProviderError, TradingCalendarProvider};
use tracing::debug;

use crate::{DataError, Result};

/// Parse `YYYY-MM-DD`, ignoring any time part after it.
pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    Date::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Trading days read from a CSV file.
///
/// Dates come from the `tradingday` column if there is one, otherwise from
/// the first column.
#[derive(Debug, Clone)]
pub struct CsvCalendar {
    path: PathBuf,
}

impl CsvCalendar {
    /// Create a calendar backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the calendar file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every trading day in the file.
    ///
    /// # Errors
    /// Returns `DataError` if the file cannot be read or a date is malformed.
    pub fn load(&self) -> Result<TradingCalendar> {
        let name = self.path.display().to_string();
        let mut reader = csv::Reader::from_path(&self.path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("tradingday"))
            .unwrap_or(0);

        let mut days = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let raw = record.get(column).unwrap_or_default();
            if raw.trim().is_empty() {
                continue;
            }
            let day = parse_date(raw).ok_or_else(|| {
                DataError::parse(&name, format!("row {}: bad date {raw:?}", line + 1))
            })?;
            days.push(day);
        }
        debug!(path = %name, days = days.len(), "calendar loaded");
        Ok(TradingCalendar::new(days))
    }
}

impl TradingCalendarProvider for CsvCalendar {
    fn trading_days(
        &self,
        start: Date,
        end: Date,
    ) -> std::result::Result<TradingCalendar, ProviderError> {
        let key = self.path.display().to_string();
        let calendar = self.load().map_err(|e| e.into_provider(&key))?.between(start, end);
        if calendar.is_empty() {
            return Err(ProviderError::no_data(format!("{key} [{start}, {end}]")));
        }
        Ok(calendar)
    }
}

/// Every weekday except listed holidays.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: Vec<Date>,
}

impl WeekdayCalendar {
    /// Create a calendar closed on `holidays` and weekends.
    pub const fn new(holidays: Vec<Date>) -> Self {
        Self { holidays }
    }
}

impl TradingCalendarProvider for WeekdayCalendar {
    fn trading_days(
        &self,
        start: Date,
        end: Date,
    ) -> std::result::Result<TradingCalendar, ProviderError> {
        Ok(TradingCalendar::weekdays(start, end, &self.holidays))
    }
}
