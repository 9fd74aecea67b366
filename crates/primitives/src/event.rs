//! Earnings events and event-window results.

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Identifier of an event (e.g. an earnings-call transcript id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Create a new event ID.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the event ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// When an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTimestamp {
    /// Wall-clock time already expressed in the exchange's local zone.
    Local(NaiveDateTime),
    /// An absolute instant, converted to exchange time before alignment.
    Utc(DateTime<Utc>),
}

/// A dated corporate event for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvent {
    /// Event identifier.
    pub event_id: EventId,
    /// Entity the event belongs to.
    pub entity_id: EntityId,
    /// Announcement time.
    pub timestamp: EventTimestamp,
}

/// Fixed event-window horizons, as trading-day offsets from the window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Horizon {
    /// Offset 0.
    #[display("1d")]
    OneDay,
    /// Offset 5.
    #[display("1w")]
    OneWeek,
    /// Offset 22.
    #[display("1m")]
    OneMonth,
    /// Offset 66.
    #[display("1q")]
    OneQuarter,
}

impl Horizon {
    /// All horizons, shortest first.
    pub const ALL: [Self; 4] = [Self::OneDay, Self::OneWeek, Self::OneMonth, Self::OneQuarter];

    /// Trading-day offset from the first day of the window.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::OneDay => 0,
            Self::OneWeek => 5,
            Self::OneMonth => 22,
            Self::OneQuarter => 66,
        }
    }
}

/// Compounded abnormal returns over the fixed horizons following one event.
///
/// Values are fractions (`index - 1`); `None` means the series did not reach
/// that offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWindowResult {
    /// Event identifier.
    #[serde(rename = "transcriptid")]
    pub event_id: EventId,
    /// Entity.
    #[serde(rename = "companyid")]
    pub entity_id: EntityId,
    /// 1-day statistic.
    #[serde(rename = "one_d_car")]
    pub one_day: Option<f64>,
    /// 1-week statistic.
    #[serde(rename = "one_w_car")]
    pub one_week: Option<f64>,
    /// 1-month statistic.
    #[serde(rename = "one_m_car")]
    pub one_month: Option<f64>,
    /// 1-quarter statistic.
    #[serde(rename = "one_q_car")]
    pub one_quarter: Option<f64>,
}

impl EventWindowResult {
    /// Result with every horizon unavailable.
    #[must_use]
    pub const fn empty(event_id: EventId, entity_id: EntityId) -> Self {
        Self { event_id, entity_id, one_day: None, one_week: None, one_month: None, one_quarter: None }
    }

    /// Statistic for a horizon.
    #[must_use]
    pub const fn get(&self, horizon: Horizon) -> Option<f64> {
        match horizon {
            Horizon::OneDay => self.one_day,
            Horizon::OneWeek => self.one_week,
            Horizon::OneMonth => self.one_month,
            Horizon::OneQuarter => self.one_quarter,
        }
    }

    /// Set the statistic for a horizon.
    pub const fn set(&mut self, horizon: Horizon, value: Option<f64>) {
        match horizon {
            Horizon::OneDay => self.one_day = value,
            Horizon::OneWeek => self.one_week = value,
            Horizon::OneMonth => self.one_month = value,
            Horizon::OneQuarter => self.one_quarter = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_offsets() {
        let offsets: Vec<usize> = Horizon::ALL.iter().map(|h| h.offset()).collect();
        assert_eq!(offsets, vec![0, 5, 22, 66]);
        assert_eq!(Horizon::OneQuarter.to_string(), "1q");
    }

    #[test]
    fn window_result_get_set() {
        let mut res = EventWindowResult::empty(EventId::from("t1"), EntityId::new(1));
        assert_eq!(res.get(Horizon::OneWeek), None);
        res.set(Horizon::OneWeek, Some(0.02));
        assert_eq!(res.get(Horizon::OneWeek), Some(0.02));
        assert_eq!(res.event_id.as_str(), "t1");
    }
}
