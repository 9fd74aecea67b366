//! Parquet artifact storage.

use std::{
    fs::File,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use chrono::Datelike;
use eventcar_primitives::{AbnormalReturnObservation, Date, EntityId, ForwardReturnObservation};
use eventcar_traits::{ArtifactStore, ProviderError};
use polars::prelude::*;
use tracing::debug;

use crate::{DataError, Result, atomic::write_atomic, prices::entity_files};

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A record type with a fixed Parquet column layout.
pub trait ParquetRecord: Sized {
    /// Build a frame from rows.
    ///
    /// # Errors
    /// Returns `PolarsError` if the columns cannot be assembled.
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame>;

    /// Read rows back from a frame written by [`ParquetRecord::to_frame`].
    ///
    /// # Errors
    /// Returns `DataError` for missing or mistyped columns.
    fn from_frame(df: &DataFrame) -> Result<Vec<Self>>;
}

fn entity_column(ids: impl Iterator<Item = EntityId>) -> Column {
    Series::new("entity_id".into(), ids.map(EntityId::get).collect::<Vec<_>>()).into()
}

fn float_column(name: &str, values: impl Iterator<Item = Option<f64>>) -> Column {
    Series::new(name.into(), values.collect::<Vec<_>>()).into()
}

fn date_column(name: &str, dates: impl Iterator<Item = Date>) -> PolarsResult<Column> {
    let days: Vec<i32> = dates.map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?.into())
}

fn read_dates(df: &DataFrame, name: &str) -> Result<Vec<Date>> {
    let days = df.column(name)?.as_materialized_series().cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|d| {
            d.and_then(|d| Date::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                .ok_or_else(|| DataError::parse(name, "missing or out-of-range date"))
        })
        .collect()
}

fn read_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = df.column(name)?.as_materialized_series().cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

fn read_entities(df: &DataFrame) -> Result<Vec<EntityId>> {
    let ids = df.column("entity_id")?.as_materialized_series().cast(&DataType::UInt64)?;
    ids.u64()?
        .into_iter()
        .map(|id| id.map(EntityId::new).ok_or_else(|| DataError::parse("entity_id", "null id")))
        .collect()
}

impl ParquetRecord for AbnormalReturnObservation {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            entity_column(rows.iter().map(|r| r.entity_id)),
            date_column("date", rows.iter().map(|r| r.date))?,
            float_column("realized_excess_return", rows.iter().map(|r| r.realized_excess_return)),
            float_column("fitted_return", rows.iter().map(|r| Some(r.fitted_return))),
            float_column("abnormal_return", rows.iter().map(|r| r.abnormal_return)),
        ])
    }

    fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let entities = read_entities(df)?;
        let dates = read_dates(df, "date")?;
        let realized = read_f64(df, "realized_excess_return")?;
        let fitted = read_f64(df, "fitted_return")?;
        let abnormal = read_f64(df, "abnormal_return")?;

        (0..df.height())
            .map(|i| {
                Ok(Self {
                    entity_id: entities[i],
                    date: dates[i],
                    realized_excess_return: realized[i],
                    fitted_return: fitted[i]
                        .ok_or_else(|| DataError::parse("fitted_return", "null value"))?,
                    abnormal_return: abnormal[i],
                })
            })
            .collect()
    }
}

impl ParquetRecord for ForwardReturnObservation {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            entity_column(rows.iter().map(|r| r.entity_id)),
            date_column("date", rows.iter().map(|r| r.date))?,
            float_column("entity_open_return", rows.iter().map(|r| r.entity_open_return)),
            float_column("entity_close_return", rows.iter().map(|r| r.entity_close_return)),
            float_column("benchmark_open_return", rows.iter().map(|r| r.benchmark_open_return)),
            float_column("benchmark_close_return", rows.iter().map(|r| r.benchmark_close_return)),
        ])
    }

    fn from_frame(df: &DataFrame) -> Result<Vec<Self>> {
        let entities = read_entities(df)?;
        let dates = read_dates(df, "date")?;
        let entity_open = read_f64(df, "entity_open_return")?;
        let entity_close = read_f64(df, "entity_close_return")?;
        let bench_open = read_f64(df, "benchmark_open_return")?;
        let bench_close = read_f64(df, "benchmark_close_return")?;

        Ok((0..df.height())
            .map(|i| Self {
                entity_id: entities[i],
                date: dates[i],
                entity_open_return: entity_open[i],
                entity_close_return: entity_close[i],
                benchmark_open_return: bench_open[i],
                benchmark_close_return: bench_close[i],
            })
            .collect())
    }
}

/// One Parquet file per entity under a directory.
///
/// Files are written to `<entity_id>.parquet.tmp` and renamed into place, so
/// an existing `<entity_id>.parquet` is always complete.
#[derive(Debug, Clone)]
pub struct ParquetArtifactStore<T> {
    dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: ParquetRecord> ParquetArtifactStore<T> {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), _record: PhantomData }
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for `entity`.
    pub fn path(&self, entity: EntityId) -> PathBuf {
        self.dir.join(format!("{entity}.parquet"))
    }

    /// Entities with a stored artifact.
    ///
    /// # Errors
    /// Returns `DataError::Io` if the directory cannot be listed.
    pub fn entities(&self) -> Result<Vec<EntityId>> {
        entity_files(&self.dir, "parquet")
    }

    fn read_rows(&self, entity: EntityId) -> Result<Vec<T>> {
        let path = self.path(entity);
        if !path.is_file() {
            return Err(DataError::MissingData {
                key: entity.to_string(),
                reason: format!("{} not found", path.display()),
            });
        }
        let df = ParquetReader::new(File::open(&path)?).finish()?;
        T::from_frame(&df)
    }

    fn write_rows(&self, entity: EntityId, rows: &[T]) -> Result<()> {
        let mut df = T::to_frame(rows)?;
        write_atomic(&self.path(entity), |w| {
            ParquetWriter::new(w).finish(&mut df)?;
            Ok(())
        })?;
        debug!(
            entity_id = %entity,
            rows = rows.len(),
            dir = %self.dir.display(),
            "artifact written"
        );
        Ok(())
    }
}

impl<T: ParquetRecord> ArtifactStore<T> for ParquetArtifactStore<T> {
    fn exists(&self, entity: EntityId) -> bool {
        self.path(entity).is_file()
    }

    fn read(&self, entity: EntityId) -> std::result::Result<Vec<T>, ProviderError> {
        self.read_rows(entity).map_err(|e| e.into_provider(&entity.to_string()))
    }

    fn write(&self, entity: EntityId, rows: &[T]) -> std::result::Result<(), ProviderError> {
        self.write_rows(entity, rows).map_err(|e| e.into_provider(&entity.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomic::temp_path;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn abnormal_rows(entity: EntityId) -> Vec<AbnormalReturnObservation> {
        vec![
            AbnormalReturnObservation::new(entity, d(2), Some(1.25), 0.75),
            AbnormalReturnObservation::new(entity, d(3), None, -0.1),
            AbnormalReturnObservation::new(entity, d(4), Some(-2.0), 0.0),
        ]
    }

    #[test]
    fn abnormal_series_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetArtifactStore::<AbnormalReturnObservation>::new(dir.path());
        let entity = EntityId::new(32307);
        let rows = abnormal_rows(entity);

        assert!(!store.exists(entity));
        store.write(entity, &rows).unwrap();

        assert!(store.exists(entity));
        assert!(!temp_path(&store.path(entity)).exists());
        assert_eq!(store.read(entity).unwrap(), rows);
        assert_eq!(store.entities().unwrap(), vec![entity]);
    }

    #[test]
    fn forward_series_survives_storage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetArtifactStore::<ForwardReturnObservation>::new(dir.path());
        let entity = EntityId::new(7);
        let rows = vec![
            ForwardReturnObservation {
                entity_id: entity,
                date: d(2),
                entity_open_return: Some(0.01),
                entity_close_return: Some(-0.02),
                benchmark_open_return: Some(0.003),
                benchmark_close_return: None,
            },
            ForwardReturnObservation {
                entity_id: entity,
                date: d(3),
                entity_open_return: None,
                entity_close_return: None,
                benchmark_open_return: None,
                benchmark_close_return: None,
            },
        ];

        store.write(entity, &rows).unwrap();
        assert_eq!(store.read(entity).unwrap(), rows);
    }

    #[test]
    fn missing_artifact_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetArtifactStore::<AbnormalReturnObservation>::new(dir.path().join("none"));
        assert!(store.read(EntityId::new(1)).unwrap_err().is_no_data());
        assert!(store.entities().unwrap().is_empty());
    }

    #[test]
    fn rewriting_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetArtifactStore::<AbnormalReturnObservation>::new(dir.path());
        let entity = EntityId::new(3);
        store.write(entity, &abnormal_rows(entity)).unwrap();
        store.write(entity, &abnormal_rows(entity)[..1]).unwrap();
        assert_eq!(store.read(entity).unwrap().len(), 1);
    }

    #[test]
    fn epoch_offset_matches_chrono() {
        let epoch = Date::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(epoch.num_days_from_ce(), UNIX_EPOCH_DAYS_FROM_CE);
    }
}
