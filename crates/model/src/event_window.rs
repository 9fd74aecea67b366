//! Cumulative abnormal returns over fixed windows after an event.

use chrono::Timelike;
use eventcar_math::{PERCENT, compound_index};
use eventcar_primitives::{
    AbnormalReturnObservation, Date, EarningsEvent, EventWindowResult, Horizon, TradingCalendar,
};
use eventcar_traits::ArtifactStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    ExchangeClock, ModelError,
    batch::{ArtifactMemo, unique_events},
};

/// Handling of events announced between the morning cutoff and the close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddayPolicy {
    /// Report the event as unaligned and produce no row.
    #[default]
    Skip,
    /// Start the window on the event day.
    SameDay,
    /// Start the window on the first trading day after the event day.
    NextDay,
}

/// Configuration for event-window aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventWindowConfig {
    /// IANA time zone of the exchange.
    pub exchange_timezone: String,
    /// Events before this local hour start on the event day.
    pub morning_cutoff_hour: u32,
    /// Events at or after this local hour start on the next trading day.
    pub close_hour: u32,
    /// Policy for events in between.
    pub midday_policy: MiddayPolicy,
}

impl Default for EventWindowConfig {
    fn default() -> Self {
        Self {
            exchange_timezone: "America/New_York".to_string(),
            morning_cutoff_hour: 12,
            close_hour: 16,
            midday_policy: MiddayPolicy::Skip,
        }
    }
}

/// First trading day of an event window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStart {
    /// The first trading day on or after the date.
    OnOrAfter(Date),
    /// The first trading day strictly after the date.
    After(Date),
}

impl WindowStart {
    /// First trading day of the window, if the calendar reaches it.
    #[must_use]
    pub fn first_day(self, calendar: &TradingCalendar) -> Option<Date> {
        match self {
            Self::OnOrAfter(day) => calendar.on_or_after(day),
            Self::After(day) => calendar.after(day),
        }
    }

    /// Rows of a date-sorted slice from the window's first trading day on.
    ///
    /// Empty when that day is missing from `rows` or from the calendar.
    pub(crate) fn rows<'a, T>(
        self,
        rows: &'a [T],
        calendar: &TradingCalendar,
        date_of: impl Fn(&T) -> Date,
    ) -> &'a [T] {
        self.first_day(calendar)
            .and_then(|first| rows.binary_search_by_key(&first, date_of).ok())
            .map_or(&rows[..0], |idx| &rows[idx..])
    }
}

/// Compounds persisted abnormal returns over the fixed horizons of each event.
#[derive(Debug, Clone)]
pub struct EventWindowAggregator {
    config: EventWindowConfig,
    clock: ExchangeClock,
}

impl Default for EventWindowAggregator {
    fn default() -> Self {
        Self { config: EventWindowConfig::default(), clock: ExchangeClock::default() }
    }
}

impl EventWindowAggregator {
    /// Create an aggregator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator with custom configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for an unknown time zone or
    /// inverted cutoff hours.
    pub fn with_config(config: EventWindowConfig) -> Result<Self, ModelError> {
        if config.morning_cutoff_hour > config.close_hour || config.close_hour > 24 {
            return Err(ModelError::InvalidConfig(format!(
                "morning cutoff {} must not be after close {}",
                config.morning_cutoff_hour, config.close_hour
            )));
        }
        let clock = ExchangeClock::from_name(&config.exchange_timezone)?;
        Ok(Self { config, clock })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EventWindowConfig {
        &self.config
    }

    /// Window start for an event, from its exchange-local hour.
    ///
    /// # Errors
    /// Returns `ModelError::UnalignedEventTime` for a midday event under
    /// [`MiddayPolicy::Skip`].
    pub fn align(&self, event: &EarningsEvent) -> Result<WindowStart, ModelError> {
        let local = self.clock.local(&event.timestamp);
        let (day, hour) = (local.date(), local.hour());

        if hour < self.config.morning_cutoff_hour {
            return Ok(WindowStart::OnOrAfter(day));
        }
        if hour >= self.config.close_hour {
            return Ok(WindowStart::After(day));
        }
        match self.config.midday_policy {
            MiddayPolicy::SameDay => Ok(WindowStart::OnOrAfter(day)),
            MiddayPolicy::NextDay => Ok(WindowStart::After(day)),
            MiddayPolicy::Skip => {
                Err(ModelError::UnalignedEventTime { event_id: event.event_id.clone(), hour })
            }
        }
    }

    /// Window statistics of one event from the entity's series.
    ///
    /// `series` must be sorted by date. The window opens on the calendar's
    /// first trading day for the event; if the series has no row for that
    /// day every horizon is `None`. Horizons past the end of the series are
    /// `None`.
    ///
    /// # Errors
    /// Returns `ModelError::UnalignedEventTime` if the event cannot be aligned.
    pub fn aggregate_one(
        &self,
        event: &EarningsEvent,
        series: &[AbnormalReturnObservation],
        calendar: &TradingCalendar,
    ) -> Result<EventWindowResult, ModelError> {
        let start = self.align(event)?;
        let window = start.rows(series, calendar, |r| r.date);

        let span = Horizon::OneQuarter.offset() + 1;
        let returns: Vec<Option<f64>> =
            window.iter().take(span).map(|r| r.abnormal_return).collect();
        let index = compound_index(&returns, PERCENT);

        let mut result = EventWindowResult::empty(event.event_id.clone(), event.entity_id);
        for horizon in Horizon::ALL {
            result.set(horizon, index.get(horizon.offset()).map(|level| level - 1.0));
        }
        Ok(result)
    }

    /// Window statistics for every event, in input order.
    ///
    /// Window starts are resolved against `calendar`. Each entity's series is
    /// read from `store` at most once. Events whose entity has no stored
    /// series, or that cannot be aligned, are logged and produce no row;
    /// repeated event ids keep their first occurrence.
    ///
    /// # Errors
    /// Returns `ModelError` if the store fails for a reason other than a
    /// missing artifact.
    pub fn aggregate<S>(
        &self,
        events: &[EarningsEvent],
        calendar: &TradingCalendar,
        store: &S,
    ) -> Result<Vec<EventWindowResult>, ModelError>
    where
        S: ArtifactStore<AbnormalReturnObservation> + ?Sized,
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
                Ok(result) => {
                    if result.one_day.is_none() {
                        debug!(event_id = %event.event_id, "no series row for the window");
                    }
                    results.push(result);
                }
                Err(err) if err.is_recoverable() => {
                    warn!(event_id = %event.event_id, error = %err, "skipping event");
                }
                Err(err) => return Err(err),
            }
        }

        info!(events = events.len(), rows = results.len(), "event windows aggregated");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::HashMap};

    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};
    use eventcar_primitives::{EntityId, EventId, EventTimestamp};
    use eventcar_traits::ProviderError;
    use rstest::rstest;

    use super::*;

    struct CountingStore {
        rows: HashMap<EntityId, Vec<AbnormalReturnObservation>>,
        reads: Cell<usize>,
    }

    impl ArtifactStore<AbnormalReturnObservation> for CountingStore {
        fn exists(&self, entity: EntityId) -> bool {
            self.rows.contains_key(&entity)
        }

        fn read(&self, entity: EntityId) -> Result<Vec<AbnormalReturnObservation>, ProviderError> {
            self.reads.set(self.reads.get() + 1);
            let rows = self.rows.get(&entity).cloned();
            rows.ok_or_else(|| ProviderError::no_data(entity.to_string()))
        }

        fn write(&self, _: EntityId, _: &[AbnormalReturnObservation]) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    fn day(d: u32) -> Date {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::weekdays(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            &[],
        )
    }

    /// Weekday series for April 2024 with the given abnormal returns (percent).
    fn series(returns: &[f64]) -> Vec<AbnormalReturnObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        start
            .iter_days()
            .filter(|d| chrono::Datelike::weekday(d).number_from_monday() <= 5)
            .zip(returns)
            .map(|(date, r)| AbnormalReturnObservation {
                entity_id: EntityId::new(1),
                date,
                realized_excess_return: Some(*r),
                fitted_return: 0.0,
                abnormal_return: Some(*r),
            })
            .collect()
    }

    fn event(id: &str, d: u32, hour: u32) -> EarningsEvent {
        EarningsEvent {
            event_id: EventId::from(id),
            entity_id: EntityId::new(1),
            timestamp: EventTimestamp::Local(day(d).and_hms_opt(hour, 30, 0).unwrap()),
        }
    }

    fn window(ev: &EarningsEvent, rows: &[AbnormalReturnObservation]) -> EventWindowResult {
        EventWindowAggregator::new().aggregate_one(ev, rows, &calendar()).unwrap()
    }

    #[rstest]
    #[case(0, WindowStart::OnOrAfter(day(10)))]
    #[case(8, WindowStart::OnOrAfter(day(10)))]
    #[case(11, WindowStart::OnOrAfter(day(10)))]
    #[case(16, WindowStart::After(day(10)))]
    #[case(23, WindowStart::After(day(10)))]
    fn alignment_by_hour(#[case] hour: u32, #[case] expected: WindowStart) {
        let aggregator = EventWindowAggregator::new();
        assert_eq!(aggregator.align(&event("e", 10, hour)).unwrap(), expected);
    }

    #[rstest]
    #[case(MiddayPolicy::SameDay, Some(WindowStart::OnOrAfter(day(10))))]
    #[case(MiddayPolicy::NextDay, Some(WindowStart::After(day(10))))]
    #[case(MiddayPolicy::Skip, None)]
    fn midday_policy(#[case] policy: MiddayPolicy, #[case] expected: Option<WindowStart>) {
        let config = EventWindowConfig { midday_policy: policy, ..EventWindowConfig::default() };
        let aggregator = EventWindowAggregator::with_config(config).unwrap();

        match (aggregator.align(&event("e", 10, 13)), expected) {
            (Ok(start), Some(expected)) => assert_eq!(start, expected),
            (Err(ModelError::UnalignedEventTime { hour, .. }), None) => assert_eq!(hour, 13),
            (other, _) => panic!("unexpected alignment: {other:?}"),
        }
    }

    #[test]
    fn utc_events_use_exchange_hour() {
        // 21:15 UTC on 2024-04-10 is 17:15 in New York.
        let ev = EarningsEvent {
            event_id: EventId::from("utc"),
            entity_id: EntityId::new(1),
            timestamp: EventTimestamp::Utc(Utc.with_ymd_and_hms(2024, 4, 10, 21, 15, 0).unwrap()),
        };
        assert_eq!(EventWindowAggregator::new().align(&ev).unwrap(), WindowStart::After(day(10)));
    }

    #[test]
    fn compounds_worked_example() {
        let rows = series(&[0.5, -0.2, 0.1, 0.0, 0.3, 1.2, 0.4]);
        // 2024-04-01 is a Monday; a pre-market event that day starts at offset 0.
        let result = window(&event("e", 1, 8), &rows);

        assert_relative_eq!(result.one_day.unwrap(), 0.005, epsilon = 1e-12);
        let expected = [0.5, -0.2, 0.1, 0.0, 0.3, 1.2]
            .iter()
            .fold(1.0, |acc, r| acc * (1.0 + r / 100.0))
            - 1.0;
        assert_relative_eq!(result.one_week.unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(result.one_week.unwrap(), 0.019089, epsilon = 1e-5);
        assert_eq!(result.one_month, None);
        assert_eq!(result.one_quarter, None);
    }

    #[test]
    fn pre_market_and_after_close_differ_by_one_day() {
        let rows = series(&[1.0, 2.0, 3.0, 4.0]);

        // 2024-04-02 is the second trading day.
        let morning = window(&event("am", 2, 8), &rows);
        let evening = window(&event("pm", 2, 17), &rows);

        assert_relative_eq!(morning.one_day.unwrap(), 0.02, epsilon = 1e-12);
        assert_relative_eq!(evening.one_day.unwrap(), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn weekend_event_starts_on_next_trading_day() {
        let rows = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        // Saturday 2024-04-06, after the close: first row after is Monday 04-08.
        let result = window(&event("sat", 6, 18), &rows);
        assert_relative_eq!(result.one_day.unwrap(), 0.06, epsilon = 1e-12);
    }

    #[test]
    fn recent_event_has_only_short_horizons() {
        let rows = series(&[0.1; 21]);
        // Event on the 13th trading day: 9 rows remain.
        let ev_day = rows[12].date;
        let ev = EarningsEvent {
            event_id: EventId::from("late"),
            entity_id: EntityId::new(1),
            timestamp: EventTimestamp::Local(ev_day.and_hms_opt(7, 0, 0).unwrap()),
        };

        let result = window(&ev, &rows);

        assert!(result.one_day.is_some());
        assert!(result.one_week.is_some());
        assert_eq!(result.one_month, None);
        assert_eq!(result.one_quarter, None);
    }

    #[test]
    fn missing_abnormal_returns_carry_the_index() {
        let mut rows = series(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        rows[2].abnormal_return = None;
        let result = window(&event("e", 1, 8), &rows);
        assert_relative_eq!(result.one_week.unwrap(), 1.01_f64.powi(5) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn event_after_series_end_is_all_null() {
        let rows = series(&[1.0, 2.0]);
        let result = window(&event("e", 29, 17), &rows);
        assert_eq!(result, EventWindowResult::empty(EventId::from("e"), EntityId::new(1)));
    }

    #[test]
    fn event_before_series_start_is_all_null() {
        let rows = series(&[3.0; 10]);
        let ev = EarningsEvent {
            event_id: EventId::from("early"),
            entity_id: EntityId::new(1),
            timestamp: EventTimestamp::Local(
                NaiveDate::from_ymd_opt(2023, 4, 3).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            ),
        };

        let result = window(&ev, &rows);

        assert_eq!(result.one_day, None);
        assert_eq!(result, EventWindowResult::empty(EventId::from("early"), EntityId::new(1)));
    }

    #[test]
    fn window_start_missing_from_series_is_all_null() {
        let mut rows = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        // Drop Wednesday 2024-04-03; a pre-market event that day must not start on Thursday.
        rows.remove(2);

        let gap = window(&event("gap", 3, 8), &rows);
        let next = window(&event("next", 3, 17), &rows);

        assert_eq!(gap, EventWindowResult::empty(EventId::from("gap"), EntityId::new(1)));
        assert_relative_eq!(next.one_day.unwrap(), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn window_start_resolves_through_the_calendar() {
        let holiday = day(8);
        let calendar = TradingCalendar::weekdays(day(1), day(30), &[holiday]);
        assert_eq!(WindowStart::After(day(5)).first_day(&calendar), Some(day(9)));
        assert_eq!(WindowStart::OnOrAfter(holiday).first_day(&calendar), Some(day(9)));
        assert_eq!(WindowStart::After(day(30)).first_day(&calendar), None);
    }

    #[test]
    fn aggregate_reads_each_entity_once() {
        let store = CountingStore {
            rows: HashMap::from([(EntityId::new(1), series(&[0.5; 30]))]),
            reads: Cell::new(0),
        };
        let mut orphan = event("orphan", 3, 8);
        orphan.entity_id = EntityId::new(99);
        let events = vec![
            event("a", 1, 8),
            event("b", 3, 13),
            event("c", 4, 17),
            orphan,
            event("a", 5, 8),
        ];

        let results =
            EventWindowAggregator::new().aggregate(&events, &calendar(), &store).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_relative_eq!(results[0].one_day.unwrap(), 0.005, epsilon = 1e-12);
        assert_eq!(store.reads.get(), 2);
    }

    #[test]
    fn config_rejects_unknown_zone() {
        let config = EventWindowConfig {
            exchange_timezone: "Nowhere/Special".to_string(),
            ..EventWindowConfig::default()
        };
        assert!(EventWindowAggregator::with_config(config).is_err());
    }
}
