//! Per-entity price files.

use std::path::{Path, PathBuf};

use eventcar_primitives::{Date, EntityId, PriceObservation};
use eventcar_traits::{PriceSeriesProvider, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DataError, Result, atomic::write_atomic, calendar::parse_date};

/// One row of a price file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PriceRecord {
    pricedate: String,
    priceopen: Option<f64>,
    priceclose: Option<f64>,
    divadjclose: Option<f64>,
    divadjfactor: Option<f64>,
}

impl PriceRecord {
    fn from_observation(obs: &PriceObservation) -> Self {
        Self {
            pricedate: obs.date.format("%Y-%m-%d").to_string(),
            priceopen: obs.open,
            priceclose: obs.close,
            divadjclose: obs.adjusted_close,
            divadjfactor: obs.adjustment_factor,
        }
    }

    fn into_observation(self, entity_id: EntityId, source: &str) -> Result<PriceObservation> {
        let date = parse_date(&self.pricedate).ok_or_else(|| {
            DataError::parse(source, format!("bad pricedate {:?}", self.pricedate))
        })?;
        Ok(PriceObservation {
            entity_id,
            date,
            open: self.priceopen,
            close: self.priceclose,
            adjusted_close: self.divadjclose,
            adjustment_factor: self.divadjfactor,
        })
    }
}

/// Directory of `<entity_id>.csv` price files.
///
/// Columns are `pricedate, priceopen, priceclose, divadjclose, divadjfactor`.
#[derive(Debug, Clone)]
pub struct CsvPriceStore {
    dir: PathBuf,
}

impl CsvPriceStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the price file for `entity`.
    pub fn path(&self, entity: EntityId) -> PathBuf {
        self.dir.join(format!("{entity}.csv"))
    }

    /// Entities with a price file, in ascending order.
    ///
    /// # Errors
    /// Returns `DataError::Io` if the directory cannot be listed.
    pub fn entities(&self) -> Result<Vec<EntityId>> {
        entity_files(&self.dir, "csv")
    }

    /// Whether a price file exists for `entity`.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.path(entity).is_file()
    }

    /// Read every price of `entity`.
    ///
    /// # Errors
    /// Returns `DataError::MissingData` if there is no file, or a parse error.
    pub fn read(&self, entity: EntityId) -> Result<Vec<PriceObservation>> {
        let path = self.path(entity);
        if !path.is_file() {
            return Err(DataError::MissingData {
                key: entity.to_string(),
                reason: format!("{} not found", path.display()),
            });
        }
        read_price_file(&path, entity)
    }

    /// Replace the price file of `entity`.
    ///
    /// # Errors
    /// Returns `DataError` if the file cannot be written.
    pub fn write(&self, entity: EntityId, prices: &[PriceObservation]) -> Result<()> {
        write_atomic(&self.path(entity), |w| {
            let mut writer = csv::Writer::from_writer(w);
            for obs in prices {
                writer.serialize(PriceRecord::from_observation(obs))?;
            }
            writer.flush()?;
            Ok(())
        })?;
        debug!(entity_id = %entity, rows = prices.len(), "prices written");
        Ok(())
    }
}

impl PriceSeriesProvider for CsvPriceStore {
    fn prices(
        &self,
        entity: EntityId,
        start: Date,
        end: Date,
    ) -> std::result::Result<Vec<PriceObservation>, ProviderError> {
        let key = entity.to_string();
        let prices: Vec<PriceObservation> = self
            .read(entity)
            .map_err(|e| e.into_provider(&key))?
            .into_iter()
            .filter(|p| p.date >= start && p.date <= end)
            .collect();
        if prices.is_empty() {
            return Err(ProviderError::no_data(key));
        }
        Ok(prices)
    }
}

/// Entity ids of the `<entity_id>.<extension>` files in `dir`.
pub(crate) fn entity_files(dir: &Path, extension: &str) -> Result<Vec<EntityId>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == extension) {
            let id = path.file_stem().and_then(|s| s.to_str()?.parse::<EntityId>().ok());
            ids.extend(id);
        }
    }
    ids.sort();
    Ok(ids)
}

/// Read a price file, tagging rows with `entity`.
///
/// # Errors
/// Returns `DataError` if the file cannot be read or parsed.
pub fn read_price_file(path: &Path, entity: EntityId) -> Result<Vec<PriceObservation>> {
    let source = path.display().to_string();
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<PriceRecord>()
        .map(|record| record?.into_observation(entity, &source))
        .collect()
}
