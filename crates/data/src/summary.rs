//! Event-level summary tables.

use std::path::Path;

use eventcar_primitives::{EventForwardReturn, EventWindowResult};
use tracing::info;

use crate::{Result, atomic::write_atomic};

/// Write one row per event with the four CAR horizons.
///
/// Columns are `transcriptid,companyid,one_d_car,one_w_car,one_m_car,one_q_car`;
/// a missing horizon is an empty cell.
///
/// # Errors
/// Returns `DataError` if the file cannot be written.
pub fn write_event_windows(path: &Path, results: &[EventWindowResult]) -> Result<()> {
    write_atomic(path, |w| {
        let mut writer = csv::Writer::from_writer(w);
        if results.is_empty() {
            writer.write_record([
                "transcriptid",
                "companyid",
                "one_d_car",
                "one_w_car",
                "one_m_car",
                "one_q_car",
            ])?;
        }
        for result in results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    })?;
    info!(path = %path.display(), events = results.len(), "event windows written");
    Ok(())
}

/// Write one row per event with its beta and each forward horizon.
///
/// Columns are `transcriptid,companyid,beta` followed by `fwd_ret_{d}d` for
/// each entry of `horizons`, in order.
///
/// # Errors
/// Returns `DataError` if the file cannot be written.
pub fn write_event_forward_returns(
    path: &Path,
    results: &[EventForwardReturn],
    horizons: &[usize],
) -> Result<()> {
    write_atomic(path, |w| {
        let mut writer = csv::Writer::from_writer(w);
        let mut header: Vec<String> =
            ["transcriptid", "companyid", "beta"].iter().map(ToString::to_string).collect();
        header.extend(horizons.iter().map(|d| format!("fwd_ret_{d}d")));
        writer.write_record(&header)?;

        for result in results {
            let mut record = vec![
                result.event_id.to_string(),
                result.entity_id.to_string(),
                result.beta.to_string(),
            ];
            record.extend(
                horizons.iter().map(|&d| result.get(d).map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    })?;
    info!(path = %path.display(), events = results.len(), "event forward returns written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use eventcar_primitives::{EntityId, EventId, ForwardHorizonReturn};

    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn event_windows_use_legacy_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.csv");
        let mut first = EventWindowResult::empty(EventId::from("101"), EntityId::new(7));
        first.one_day = Some(0.5);
        first.one_week = Some(-0.25);
        let second = EventWindowResult::empty(EventId::from("102"), EntityId::new(8));

        write_event_windows(&path, &[first, second]).unwrap();

        let text = read(&path);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "transcriptid,companyid,one_d_car,one_w_car,one_m_car,one_q_car");
        assert_eq!(lines[1], "101,7,0.5,-0.25,,");
        assert_eq!(lines[2], "102,8,,,,");
    }

    #[test]
    fn empty_event_windows_still_have_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("car.csv");

        write_event_windows(&path, &[]).unwrap();

        assert_eq!(
            read(&path).trim(),
            "transcriptid,companyid,one_d_car,one_w_car,one_m_car,one_q_car"
        );
    }

    #[test]
    fn forward_returns_have_one_column_per_horizon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fwd.csv");
        let result = EventForwardReturn {
            event_id: EventId::from("9"),
            entity_id: EntityId::new(3),
            beta: 1.5,
            horizons: vec![
                ForwardHorizonReturn { days: 1, value: Some(0.25) },
                ForwardHorizonReturn { days: 5, value: None },
            ],
        };

        write_event_forward_returns(&path, &[result], &[1, 5]).unwrap();

        let text = read(&path);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "transcriptid,companyid,beta,fwd_ret_1d,fwd_ret_5d");
        assert_eq!(lines[1], "9,3,1.5,0.25,");
    }
}
