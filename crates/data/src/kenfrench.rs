//! Daily factor returns from the Ken French data library.

use std::{
    fs,
    io::{Cursor, Read, Write},
    path::PathBuf,
    time::Duration,
};

use eventcar_primitives::{Date, FactorObservation, FactorTable};
use eventcar_traits::{FactorTableProvider, ProviderError, TableLoader};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::{DataError, Result, atomic::write_atomic};

/// Key of the daily five-factor (2x3) file.
pub const FIVE_FACTORS_DAILY: &str = "F-F_Research_Data_5_Factors_2x3_daily";

/// Key of the daily momentum file.
pub const MOMENTUM_DAILY: &str = "F-F_Momentum_Factor_daily";

const FIVE_FACTOR_COLUMNS: [&str; 6] = ["Mkt-RF", "SMB", "HML", "RMW", "CMA", "RF"];

/// Download location of the library's zipped CSV files.
pub const KEN_FRENCH_BASE_URL: &str =
    "https://mba.tuck.dartmouth.edu/pages/faculty/ken.french/ftp";

/// Default directory for cached factor files.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("eventcar")
}

/// Downloads `<base_url>/<key>_CSV.zip` and returns the CSV inside.
#[derive(Debug, Clone)]
pub struct HttpTableLoader {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTableLoader {
    /// Create a loader for the Ken French library.
    ///
    /// # Errors
    /// Returns `DataError::Network` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_base_url(KEN_FRENCH_BASE_URL, Duration::from_secs(60))
    }

    /// Create a loader for another mirror of the library.
    ///
    /// # Errors
    /// Returns `DataError::Network` if the HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    fn fetch(&self, key: &str) -> Result<String> {
        let url = format!("{}/{key}_CSV.zip", self.base_url.trim_end_matches('/'));
        info!(%url, "downloading factor file");
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::MissingData { key: key.to_string(), reason: url });
        }
        if !status.is_success() {
            return Err(DataError::Http { url, status: status.as_u16() });
        }
        extract_single_csv(&response.bytes()?, key)
    }
}

impl TableLoader for HttpTableLoader {
    fn load(&self, key: &str) -> std::result::Result<String, ProviderError> {
        self.fetch(key).map_err(|e| e.into_provider(key))
    }
}

/// Text of the first CSV entry in a ZIP archive.
fn extract_single_csv(bytes: &[u8], key: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx)?;
        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        return Ok(String::from_utf8_lossy(&buf).into_owned());
    }
    Err(DataError::parse(key, "archive holds no CSV entry"))
}

/// Serves tables from `<dir>/<key>.csv`, filling misses from `inner`.
#[derive(Debug, Clone)]
pub struct DiskCacheLoader<L> {
    dir: PathBuf,
    inner: L,
}

impl<L: TableLoader> DiskCacheLoader<L> {
    /// Create a cache in `dir` in front of `inner`.
    pub fn new(dir: impl Into<PathBuf>, inner: L) -> Self {
        Self { dir: dir.into(), inner }
    }

    /// Path of the cached table for `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.csv"))
    }
}

impl<L: TableLoader> TableLoader for DiskCacheLoader<L> {
    fn load(&self, key: &str) -> std::result::Result<String, ProviderError> {
        let path = self.path(key);
        if path.is_file() {
            debug!(path = %path.display(), "factor cache hit");
            return Ok(fs::read_to_string(&path)?);
        }

        let text = self.inner.load(key)?;
        write_atomic(&path, |w| Ok(w.write_all(text.as_bytes())?))
            .map_err(|e| e.into_provider(key))?;
        debug!(path = %path.display(), "factor cache filled");
        Ok(text)
    }
}

/// Five-factor plus momentum table, in percent as published.
#[derive(Debug, Clone)]
pub struct KenFrenchFactors<L> {
    loader: L,
}

impl<L: TableLoader> KenFrenchFactors<L> {
    /// Create a provider reading both files through `loader`.
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }
}

impl<L: TableLoader> FactorTableProvider for KenFrenchFactors<L> {
    fn factor_table(&self) -> std::result::Result<FactorTable, ProviderError> {
        let five = self.loader.load(FIVE_FACTORS_DAILY)?;
        let momentum = self.loader.load(MOMENTUM_DAILY)?;

        let five = parse_factor_csv(&five, FIVE_FACTORS_DAILY, &FIVE_FACTOR_COLUMNS)
            .map_err(|e| e.into_provider(FIVE_FACTORS_DAILY))?;
        let momentum = parse_factor_csv(&momentum, MOMENTUM_DAILY, &["Mom"])
            .map_err(|e| e.into_provider(MOMENTUM_DAILY))?;

        let table = join_factors(&five, &momentum);
        if table.is_empty() {
            return Err(ProviderError::no_data("factor table"));
        }
        debug!(
            days = table.len(),
            five_factor_days = five.len(),
            momentum_days = momentum.len(),
            "factor table joined"
        );
        Ok(table)
    }
}

/// Dated rows of the requested columns, in the requested order.
type FactorRows = Vec<(Date, Vec<f64>)>;

/// Parse a library CSV: a free-text preamble, a header row whose first cell
/// is empty, `YYYYMMDD` rows, then a footer.
///
/// Columns are looked up by trimmed header name. Parsing stops at the first
/// row after the data that does not start with a date.
fn parse_factor_csv(text: &str, source: &str, columns: &[&str]) -> Result<FactorRows> {
    let mut lines = text.lines().enumerate();
    let header = lines
        .by_ref()
        .find(|(_, line)| line.starts_with(',') && line.chars().any(char::is_alphabetic))
        .ok_or_else(|| DataError::parse(source, "no header row"))?;

    let names: Vec<&str> = header.1.split(',').map(str::trim).collect();
    let positions: Vec<usize> = columns
        .iter()
        .map(|c| {
            names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(c))
                .ok_or_else(|| DataError::parse(source, format!("missing column {c}")))
        })
        .collect::<Result<_>>()?;

    let mut rows = Vec::new();
    let body: String = lines.map(|(_, l)| format!("{l}\n")).collect();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    for record in reader.records() {
        let record = record?;
        let Some(date) = record.get(0).and_then(|raw| Date::parse_from_str(raw, "%Y%m%d").ok())
        else {
            if rows.is_empty() {
                continue;
            }
            break;
        };
        let values = positions
            .iter()
            .map(|&i| {
                record
                    .get(i)
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or_else(|| {
                        DataError::parse(source, format!("{date}: bad value in column {i}"))
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push((date, values));
    }

    if rows.is_empty() {
        return Err(DataError::parse(source, "no dated rows"));
    }
    Ok(rows)
}

/// Inner join of the five-factor and momentum rows on date.
fn join_factors(five: &[(Date, Vec<f64>)], momentum: &[(Date, Vec<f64>)]) -> FactorTable {
    let momentum: std::collections::HashMap<Date, f64> =
        momentum.iter().filter_map(|(d, v)| Some((*d, *v.first()?))).collect();

    FactorTable::new(five.iter().filter_map(|(date, v)| {
        let mom = momentum.get(date)?;
        match v.as_slice() {
            [mkt, smb, hml, rmw, cma, rf] => Some(FactorObservation {
                date: *date,
                market_excess: *mkt,
                size: *smb,
                value: *hml,
                quality: *rmw,
                investment: *cma,
                momentum: *mom,
                risk_free: *rf,
            }),
            _ => None,
        }
    }))
}
