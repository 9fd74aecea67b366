//! Event reference table.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use eventcar_primitives::{EarningsEvent, EntityId, EventId, EventTimestamp};
use tracing::debug;

use crate::{DataError, Result};

const EVENT_ID_COLUMNS: [&str; 2] = ["event_id", "transcriptid"];
const ENTITY_ID_COLUMNS: [&str; 2] = ["entity_id", "companyid"];
const TIMESTAMP_COLUMNS: [&str; 2] = ["timestamp", "ec_et"];

/// Parse an event timestamp.
///
/// RFC 3339 values carry their own offset and are kept as instants; naive
/// `YYYY-MM-DD HH:MM:SS` values are taken as exchange-local wall clock.
pub fn parse_event_timestamp(raw: &str) -> Option<EventTimestamp> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(EventTimestamp::Utc(at.with_timezone(&Utc)));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(EventTimestamp::Local)
}

/// Parse an entity id, accepting whole numbers written as floats (`24937.0`).
fn parse_entity_id(raw: &str) -> Option<EntityId> {
    if let Ok(id) = raw.parse::<EntityId>() {
        return Some(id);
    }
    let v = raw.parse::<f64>().ok()?;
    let whole = v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64;
    whole.then(|| EntityId::new(v as u64))
}

/// Read events in file order.
///
/// Columns are found by name: `event_id` (or `transcriptid`), `entity_id`
/// (or `companyid`) and `timestamp` (or `ec_et`). Other columns are ignored.
///
/// # Errors
/// Returns `DataError::Parse` for a missing column or an unreadable row.
pub fn read_events(path: &Path) -> Result<Vec<EarningsEvent>> {
    let source = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
            .ok_or_else(|| DataError::parse(&source, format!("missing column {}", names[0])))
    };
    let (id_col, entity_col, ts_col) =
        (find(&EVENT_ID_COLUMNS)?, find(&ENTITY_ID_COLUMNS)?, find(&TIMESTAMP_COLUMNS)?);

    let mut events = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or_default();
        let bad = |what: &str| DataError::parse(&source, format!("row {}: bad {what}", row + 1));

        let entity_id = parse_entity_id(field(entity_col)).ok_or_else(|| bad("entity id"))?;
        let timestamp = parse_event_timestamp(field(ts_col)).ok_or_else(|| bad("timestamp"))?;
        let event_id = match field(id_col) {
            "" => return Err(bad("event id")),
            id => EventId::new(id.trim_end_matches(".0")),
        };

        events.push(EarningsEvent { event_id, entity_id, timestamp });
    }
    debug!(path = %source, events = events.len(), "events loaded");
    Ok(events)
}
