//! Forward (next-day) return records.

use serde::{Deserialize, Serialize};

use crate::{Date, EntityId, EventId};

/// Next-day returns of an entity and its benchmark, as fractions.
///
/// The value on date `t` is the return earned from `t` to the following row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardReturnObservation {
    /// Entity.
    pub entity_id: EntityId,
    /// Trading date the holding period starts on.
    pub date: Date,
    /// Open-to-open entity return.
    pub entity_open_return: Option<f64>,
    /// Close-to-close entity return.
    pub entity_close_return: Option<f64>,
    /// Open-to-open benchmark return.
    pub benchmark_open_return: Option<f64>,
    /// Close-to-close benchmark return.
    pub benchmark_close_return: Option<f64>,
}

/// Beta-adjusted forward return at one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardHorizonReturn {
    /// Holding period in trading days.
    pub days: usize,
    /// Entity return minus beta times benchmark return; `None` past the data.
    pub value: Option<f64>,
}

/// Forward returns following one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventForwardReturn {
    /// Event identifier.
    pub event_id: EventId,
    /// Entity.
    pub entity_id: EntityId,
    /// Beta used for the benchmark adjustment.
    pub beta: f64,
    /// One entry per configured horizon, in configuration order.
    pub horizons: Vec<ForwardHorizonReturn>,
}

impl EventForwardReturn {
    /// Value for a horizon in days, if that horizon was computed.
    #[must_use]
    pub fn get(&self, days: usize) -> Option<f64> {
        self.horizons.iter().find(|h| h.days == days).and_then(|h| h.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_by_days() {
        let res = EventForwardReturn {
            event_id: EventId::from("e"),
            entity_id: EntityId::new(1),
            beta: 1.0,
            horizons: vec![
                ForwardHorizonReturn { days: 1, value: Some(0.01) },
                ForwardHorizonReturn { days: 22, value: None },
            ],
        };
        assert_eq!(res.get(1), Some(0.01));
        assert_eq!(res.get(22), None);
        assert_eq!(res.get(5), None);
    }
}
