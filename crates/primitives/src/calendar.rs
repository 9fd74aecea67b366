//! Trading calendar.

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::Date;

/// Ordered set of valid market days.
///
/// The canonical time axis: sparse price histories are left-joined onto it so
/// that missing days become explicit gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingCalendar {
    days: Vec<Date>,
}

impl TradingCalendar {
    /// Build a calendar from arbitrary dates. Sorted and deduplicated.
    #[must_use]
    pub fn new(days: impl IntoIterator<Item = Date>) -> Self {
        let mut days: Vec<Date> = days.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        Self { days }
    }

    /// Every Monday to Friday in `[start, end]` that is not listed in `holidays`.
    #[must_use]
    pub fn weekdays(start: Date, end: Date, holidays: &[Date]) -> Self {
        let days = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .filter(|d| !holidays.contains(d));
        Self::new(days)
    }

    /// Number of trading days.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.days.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Trading days in ascending order.
    #[must_use]
    pub fn days(&self) -> &[Date] {
        &self.days
    }

    /// First trading day.
    #[must_use]
    pub fn first(&self) -> Option<Date> {
        self.days.first().copied()
    }

    /// Last trading day.
    #[must_use]
    pub fn last(&self) -> Option<Date> {
        self.days.last().copied()
    }

    /// Whether `date` is a trading day.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    /// Sub-calendar restricted to `[start, end]`.
    #[must_use]
    pub fn between(&self, start: Date, end: Date) -> Self {
        let lo = self.days.partition_point(|d| *d < start);
        let hi = self.days.partition_point(|d| *d <= end);
        let days = if lo < hi { self.days[lo..hi].to_vec() } else { Vec::new() };
        Self { days }
    }

    /// First trading day on or after `date`.
    #[must_use]
    pub fn on_or_after(&self, date: Date) -> Option<Date> {
        let idx = self.days.partition_point(|d| *d < date);
        self.days.get(idx).copied()
    }

    /// First trading day strictly after `date`.
    #[must_use]
    pub fn after(&self, date: Date) -> Option<Date> {
        let idx = self.days.partition_point(|d| *d <= date);
        self.days.get(idx).copied()
    }
}
