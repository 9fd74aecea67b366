//! End-to-end run on synthetic data: prices on disk, abnormal returns in
//! Parquet, event windows in CSV.

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use eventcar::{
    data::{CsvPriceStore, ParquetArtifactStore, read_events, write_event_windows},
    model::{
        AbnormalReturnModel, ComputeOutcome, EntityInputs, EventWindowAggregator, SkipReason,
    },
    primitives::{
        AbnormalReturnObservation, Date, EntityId, FactorObservation, FactorTable, Horizon,
        PriceObservation, TradingCalendar,
    },
    traits::ArtifactStore,
};

const CLEAN: EntityId = EntityId::new(101);
const SHOCKED: EntityId = EntityId::new(202);
const SHOCK_DAY: usize = 500;
const SHOCK_PERCENT: f64 = 10.0;

fn calendar() -> TradingCalendar {
    TradingCalendar::weekdays(
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 6, 30).unwrap(),
        &[],
    )
}

fn factors(days: &[Date]) -> FactorTable {
    FactorTable::new(days.iter().enumerate().map(|(i, &date)| {
        let t = i as f64;
        FactorObservation {
            date,
            market_excess: 0.9 * (t * 0.7).sin(),
            size: 0.4 * (t * 1.3).cos(),
            value: 0.3 * (t * 0.37 + 1.0).sin(),
            quality: 0.2 * (t * 2.1).cos(),
            investment: 0.25 * (t * 0.91).sin(),
            momentum: 0.35 * (t * 0.53).cos(),
            risk_free: 0.01,
        }
    }))
}

/// Closes whose daily percent returns are exactly explained by the factors,
/// plus an optional one-day shock.
fn prices(entity: EntityId, table: &FactorTable, shock: Option<usize>) -> Vec<PriceObservation> {
    let mut close = 50.0;
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i > 0 {
                let mut r = f.risk_free + 1.2 * f.market_excess + 0.4 * f.size - 0.3 * f.value;
                if shock == Some(i) {
                    r += SHOCK_PERCENT;
                }
                close *= 1.0 + r / 100.0;
            }
            PriceObservation::from_closes(entity, f.date, close, close)
        })
        .collect()
}

#[test]
fn prices_to_event_windows() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = calendar();
    let table = factors(calendar.days());
    let days = calendar.days();
    let (start, end) = (days[0], days[days.len() - 1]);

    let price_store = CsvPriceStore::new(dir.path().join("prices"));
    price_store.write(CLEAN, &prices(CLEAN, &table, None)).unwrap();
    price_store.write(SHOCKED, &prices(SHOCKED, &table, Some(SHOCK_DAY))).unwrap();

    let artifacts = ParquetArtifactStore::<AbnormalReturnObservation>::new(dir.path().join("car"));
    let model = AbnormalReturnModel::new();
    let inputs =
        EntityInputs { prices: &price_store, calendar: &calendar, factors: &table, start, end };

    for entity in [CLEAN, SHOCKED] {
        let outcome = model.compute_and_store(entity, &inputs, &artifacts).unwrap();
        assert!(matches!(outcome, ComputeOutcome::Written { rows } if rows > 0));
    }
    assert_eq!(
        model.compute_and_store(CLEAN, &inputs, &artifacts).unwrap(),
        ComputeOutcome::Skipped(SkipReason::ArtifactExists)
    );
    assert_eq!(
        model.compute_and_store(EntityId::new(303), &inputs, &artifacts).unwrap(),
        ComputeOutcome::Skipped(SkipReason::NoData)
    );

    let clean = artifacts.read(CLEAN).unwrap();
    for row in &clean {
        assert_abs_diff_eq!(row.abnormal_return.unwrap(), 0.0, epsilon = 1e-6);
    }

    let events_path = dir.path().join("events.csv");
    let shock_day = days[SHOCK_DAY].format("%Y-%m-%d");
    std::fs::write(
        &events_path,
        format!(
            "transcriptid,companyid,ec_et\n\
             1.0,{CLEAN},{shock_day} 08:00:00\n\
             2.0,{SHOCKED},{shock_day} 08:00:00\n\
             3.0,303,{shock_day} 08:00:00\n\
             4.0,{SHOCKED},{shock_day} 13:00:00\n\
             2.0,{CLEAN},{shock_day} 17:00:00\n"
        ),
    )
    .unwrap();
    let events = read_events(&events_path).unwrap();
    assert_eq!(events.len(), 5);

    let windows =
        EventWindowAggregator::new().aggregate(&events, &calendar, &artifacts).unwrap();

    let ids: Vec<_> = windows.iter().map(|w| w.event_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    for horizon in Horizon::ALL {
        assert_abs_diff_eq!(windows[0].get(horizon).unwrap(), 0.0, epsilon = 1e-5);
    }
    let shocked = &windows[1];
    assert_eq!(shocked.entity_id, SHOCKED);
    assert!(shocked.one_day.unwrap() > 0.05, "one-day CAR {:?}", shocked.one_day);
    assert!(shocked.one_quarter.is_some());

    let output = dir.path().join("event_car.csv");
    write_event_windows(&output, &windows).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "transcriptid,companyid,one_d_car,one_w_car,one_m_car,one_q_car");
    assert!(lines[2].starts_with("2,202,"));
}
