//! Sequential per-entity batch processing.

use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    fmt,
};

use eventcar_primitives::{EarningsEvent, EntityId};
use eventcar_traits::ArtifactStore;
use tracing::{info, warn};

use crate::ModelError;

/// Why an entity produced no new artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An artifact was already stored.
    ArtifactExists,
    /// The price history is too short.
    InsufficientHistory,
    /// The provider has no data for the entity.
    NoData,
}

/// Result of processing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeOutcome {
    /// A new artifact was written.
    Written {
        /// Rows written.
        rows: usize,
    },
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Counts of per-entity outcomes over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Entities with a new artifact.
    pub written: usize,
    /// Entities whose artifact already existed.
    pub skipped_existing: usize,
    /// Entities with too little price history.
    pub skipped_insufficient: usize,
    /// Entities the provider had no data for.
    pub skipped_no_data: usize,
    /// Entities that failed with an error.
    pub failed: usize,
}

impl BatchSummary {
    /// Record one outcome.
    pub const fn record(&mut self, outcome: ComputeOutcome) {
        match outcome {
            ComputeOutcome::Written { .. } => self.written += 1,
            ComputeOutcome::Skipped(SkipReason::ArtifactExists) => self.skipped_existing += 1,
            ComputeOutcome::Skipped(SkipReason::InsufficientHistory) => {
                self.skipped_insufficient += 1;
            }
            ComputeOutcome::Skipped(SkipReason::NoData) => self.skipped_no_data += 1,
        }
    }

    /// Number of entities seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.written
            + self.skipped_existing
            + self.skipped_insufficient
            + self.skipped_no_data
            + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities: {} written, {} already stored, {} insufficient history, \
             {} without data, {} failed",
            self.total(),
            self.written,
            self.skipped_existing,
            self.skipped_insufficient,
            self.skipped_no_data,
            self.failed
        )
    }
}

/// Runs a per-entity job over a list of entities, one at a time.
///
/// A failing entity is logged and counted; the batch always runs to the end.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    label: String,
}

impl BatchRunner {
    /// Create a runner whose log events carry `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    /// Run `job` for every distinct entity, in first-seen order.
    pub fn run<I, F>(&self, entities: I, mut job: F) -> BatchSummary
    where
        I: IntoIterator<Item = EntityId>,
        F: FnMut(EntityId) -> Result<ComputeOutcome, ModelError>,
    {
        let mut seen = HashSet::new();
        let mut summary = BatchSummary::default();
        for entity in entities {
            if !seen.insert(entity) {
                continue;
            }
            match job(entity) {
                Ok(outcome) => summary.record(outcome),
                Err(err) => {
                    summary.failed += 1;
                    warn!(batch = %self.label, entity_id = %entity, error = %err, "entity failed");
                }
            }
        }
        info!(batch = %self.label, %summary, "batch finished");
        summary
    }
}

/// Per-run cache of stored artifacts, read at most once per entity.
pub(crate) struct ArtifactMemo<'s, T, S: ?Sized> {
    store: &'s S,
    loaded: HashMap<EntityId, Option<Vec<T>>>,
}

impl<'s, T, S> ArtifactMemo<'s, T, S>
where
    S: ArtifactStore<T> + ?Sized,
{
    pub(crate) fn new(store: &'s S) -> Self {
        Self { store, loaded: HashMap::new() }
    }

    /// Stored rows for `entity`, or `None` if nothing is stored.
    pub(crate) fn get(&mut self, entity: EntityId) -> Result<Option<&[T]>, ModelError> {
        let rows = match self.loaded.entry(entity) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let rows = match self.store.read(entity) {
                    Ok(rows) => Some(rows),
                    Err(err) if err.is_no_data() => None,
                    Err(err) => return Err(err.into()),
                };
                slot.insert(rows)
            }
        };
        Ok(rows.as_deref())
    }
}

/// Events with a previously seen id removed, keeping the first occurrence.
pub(crate) fn unique_events(events: &[EarningsEvent]) -> Vec<&EarningsEvent> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|event| {
            let fresh = seen.insert(&event.event_id);
            if !fresh {
                warn!(event_id = %event.event_id, "duplicate event id, keeping the first");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use eventcar_primitives::{EventId, EventTimestamp};
    use rstest::rstest;

    use super::*;

    #[test]
    fn runner_counts_every_outcome() {
        let runner = BatchRunner::new("test");
        let summary = runner.run((1..=6).map(EntityId::new), |entity| match entity.get() {
            1 | 2 => Ok(ComputeOutcome::Written { rows: 10 }),
            3 => Ok(ComputeOutcome::Skipped(SkipReason::ArtifactExists)),
            4 => Ok(ComputeOutcome::Skipped(SkipReason::InsufficientHistory)),
            5 => Ok(ComputeOutcome::Skipped(SkipReason::NoData)),
            _ => Err(ModelError::InvalidConfig("boom".to_string())),
        });

        assert_eq!(
            summary,
            BatchSummary {
                written: 2,
                skipped_existing: 1,
                skipped_insufficient: 1,
                skipped_no_data: 1,
                failed: 1,
            }
        );
        assert_eq!(summary.total(), 6);
        assert!(summary.to_string().starts_with("6 entities: 2 written"));
    }

    #[rstest]
    #[case(vec![1, 2, 1, 3, 2], 3)]
    #[case(vec![], 0)]
    fn runner_visits_each_entity_once(#[case] ids: Vec<u64>, #[case] expected: usize) {
        let mut visited = Vec::new();
        let summary = BatchRunner::default().run(ids.into_iter().map(EntityId::new), |entity| {
            visited.push(entity);
            Ok(ComputeOutcome::Written { rows: 1 })
        });
        assert_eq!(visited.len(), expected);
        assert_eq!(summary.written, expected);
    }

    #[test]
    fn duplicate_events_keep_first() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let event = |id: &str, entity: u64| EarningsEvent {
            event_id: EventId::from(id),
            entity_id: EntityId::new(entity),
            timestamp: EventTimestamp::Local(at),
        };
        let events = vec![event("a", 1), event("b", 1), event("a", 2)];

        let unique = unique_events(&events);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].entity_id, EntityId::new(1));
        assert_eq!(unique[1].event_id, EventId::from("b"));
    }
}
