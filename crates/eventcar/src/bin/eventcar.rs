//! Event-study pipeline CLI.
//!
//! Usage: `eventcar [--log-format json|pretty] [--config FILE] <COMMAND>`
//!
//! Each command is idempotent per entity: stored artifacts are skipped, so an
//! interrupted run can simply be repeated.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use chrono::{Days, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use eventcar::{
    data::{
        CsvCalendar, CsvPriceStore, DiskCacheLoader, HttpTableLoader, KenFrenchFactors,
        ParquetArtifactStore, WeekdayCalendar, YahooPriceFetcher, default_cache_dir, read_events,
        write_event_forward_returns, write_event_windows,
    },
    model::{BatchRunner, ComputeOutcome, EntityInputs, ModelError, PipelineConfig, SkipReason},
    primitives::{EarningsEvent, EntityId, EventTimestamp, TradingCalendar},
    traits::{FactorTableProvider, PriceSeriesProvider, TradingCalendarProvider},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "EVENTCAR_LOG";

/// Default first price date.
const DEFAULT_START: &str = "1990-01-01";

/// Days past the last event searched for its first trading day.
const EVENT_CALENDAR_PAD_DAYS: u64 = 31;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "eventcar", version, about = "Cumulative abnormal returns around earnings events")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Pipeline configuration (JSON); omitted fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download daily prices from Yahoo Finance into per-entity CSV files.
    FetchPrices(FetchPricesArgs),
    /// Compute and store daily abnormal returns per entity.
    Car(CarArgs),
    /// Compound stored abnormal returns after each event.
    EventCar(EventArgs),
    /// Compute and store next-day forward returns against a benchmark.
    FwdRet(FwdRetArgs),
    /// Beta-adjusted forward returns after each event.
    EventFwdRet(EventArgs),
}

#[derive(Debug, Clone, Args)]
struct RangeArgs {
    /// First date (YYYY-MM-DD).
    #[arg(long, default_value = DEFAULT_START)]
    start: NaiveDate,

    /// Last date (YYYY-MM-DD), today if omitted.
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl RangeArgs {
    fn resolve(&self) -> CliResult<(NaiveDate, NaiveDate)> {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        if self.start > end {
            return Err(format!("start {} is after end {end}", self.start).into());
        }
        Ok((self.start, end))
    }
}

#[derive(Debug, Args)]
struct FetchPricesArgs {
    /// Price directory.
    #[arg(long)]
    prices: PathBuf,

    /// Ticker to entity id, e.g. `NVDA=32307`. Repeatable.
    #[arg(long = "map", value_parser = parse_mapping, required = true)]
    mappings: Vec<(String, EntityId)>,

    /// Replace existing price files.
    #[arg(long)]
    overwrite: bool,

    /// Pause between requests, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    rate_limit_ms: u64,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Debug, Args)]
struct CarArgs {
    /// Price directory.
    #[arg(long)]
    prices: PathBuf,

    /// Artifact directory for abnormal returns.
    #[arg(long)]
    output: PathBuf,

    /// Trading calendar CSV; weekdays if omitted.
    #[arg(long)]
    calendar: Option<PathBuf>,

    /// Cache directory for factor files.
    #[arg(long)]
    factors_cache: Option<PathBuf>,

    /// Entities to process; every price file if omitted.
    #[arg(long, value_delimiter = ',')]
    entities: Vec<EntityId>,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Debug, Args)]
struct FwdRetArgs {
    /// Price directory.
    #[arg(long)]
    prices: PathBuf,

    /// Artifact directory for forward returns.
    #[arg(long)]
    output: PathBuf,

    /// Entity id of the benchmark price file.
    #[arg(long, default_value_t = EntityId::new(0))]
    benchmark: EntityId,

    /// Entities to process; every price file if omitted.
    #[arg(long, value_delimiter = ',')]
    entities: Vec<EntityId>,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Debug, Args)]
struct EventArgs {
    /// Event reference CSV.
    #[arg(long)]
    events: PathBuf,

    /// Artifact directory written by the per-entity command.
    #[arg(long)]
    artifacts: PathBuf,

    /// Output CSV.
    #[arg(long)]
    output: PathBuf,

    /// Trading calendar CSV; weekdays if omitted.
    #[arg(long)]
    calendar: Option<PathBuf>,
}

fn parse_mapping(raw: &str) -> Result<(String, EntityId), String> {
    let (symbol, id) =
        raw.split_once('=').ok_or_else(|| format!("expected SYMBOL=ENTITY_ID, got {raw:?}"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("empty symbol in {raw:?}"));
    }
    let id = id.parse::<EntityId>().map_err(|e| format!("bad entity id in {raw:?}: {e}"))?;
    Ok((symbol.to_uppercase(), id))
}

fn init_logging(format: LogFormat) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|level| EnvFilter::try_new(level.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(matches!(format, LogFormat::Pretty));
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_format) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    info!(command = ?cli.command, config = ?cli.config, "eventcar starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::FetchPrices(args) => fetch_prices(&args),
        Command::Car(args) => car(&config, &args),
        Command::EventCar(args) => event_car(&config, &args),
        Command::FwdRet(args) => fwd_ret(&config, &args),
        Command::EventFwdRet(args) => event_fwd_ret(&config, &args),
    }
}

fn fetch_prices(args: &FetchPricesArgs) -> CliResult {
    let (start, end) = args.range.resolve()?;
    let store = CsvPriceStore::new(&args.prices);
    let fetcher = YahooPriceFetcher::with_rate_limit(Duration::from_millis(args.rate_limit_ms))?;
    let runtime = tokio::runtime::Runtime::new()?;
    let symbols: HashMap<EntityId, &str> =
        args.mappings.iter().map(|(symbol, id)| (*id, symbol.as_str())).collect();

    let summary = BatchRunner::new("fetch-prices").run(
        args.mappings.iter().map(|(_, id)| *id),
        |entity| {
            if store.contains(entity) && !args.overwrite {
                info!(entity_id = %entity, "price file exists, skipping");
                return Ok(ComputeOutcome::Skipped(SkipReason::ArtifactExists));
            }
            let symbol = symbols.get(&entity).copied().unwrap_or_default();
            let prices = match runtime.block_on(fetcher.fetch(symbol, entity, start, end)) {
                Ok(prices) => prices,
                Err(err) => {
                    let err = err.into_provider(symbol);
                    if err.is_no_data() {
                        info!(entity_id = %entity, symbol, "no quotes, skipping");
                        return Ok(ComputeOutcome::Skipped(SkipReason::NoData));
                    }
                    return Err(err.into());
                }
            };
            store
                .write(entity, &prices)
                .map_err(|e| ModelError::from(e.into_provider(&entity.to_string())))?;
            Ok(ComputeOutcome::Written { rows: prices.len() })
        },
    );

    println!("fetch-prices: {summary}");
    Ok(())
}

fn load_calendar(
    path: Option<&Path>,
    start: NaiveDate,
    end: NaiveDate,
) -> CliResult<TradingCalendar> {
    let calendar = match path {
        Some(path) => CsvCalendar::new(path).trading_days(start, end)?,
        None => WeekdayCalendar::new(Vec::new()).trading_days(start, end)?,
    };
    info!(
        days = calendar.len(),
        first = ?calendar.first(),
        last = ?calendar.last(),
        "trading calendar loaded"
    );
    Ok(calendar)
}

/// Trading days around the events, used to find each window's first day.
fn event_calendar(path: Option<&Path>, events: &[EarningsEvent]) -> CliResult<TradingCalendar> {
    let dates = events.iter().map(|event| match &event.timestamp {
        EventTimestamp::Local(t) => t.date(),
        EventTimestamp::Utc(t) => t.date_naive(),
    });
    let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
        return Ok(TradingCalendar::default());
    };
    load_calendar(path, first - Days::new(1), last + Days::new(EVENT_CALENDAR_PAD_DAYS))
}

fn entities_or_all(explicit: &[EntityId], prices: &CsvPriceStore) -> CliResult<Vec<EntityId>> {
    if explicit.is_empty() { Ok(prices.entities()?) } else { Ok(explicit.to_vec()) }
}

fn car(config: &PipelineConfig, args: &CarArgs) -> CliResult {
    let model = config.abnormal_model()?;
    let (start, end) = args.range.resolve()?;
    let prices = CsvPriceStore::new(&args.prices);
    let calendar = load_calendar(args.calendar.as_deref(), start, end)?;

    let cache = args.factors_cache.clone().unwrap_or_else(default_cache_dir);
    let factors =
        KenFrenchFactors::new(DiskCacheLoader::new(cache, HttpTableLoader::new()?)).factor_table()?;
    info!(rows = factors.len(), last = ?factors.last_date(), "factor table loaded");

    let store = ParquetArtifactStore::new(&args.output);
    let inputs =
        EntityInputs { prices: &prices, calendar: &calendar, factors: &factors, start, end };
    let summary = BatchRunner::new("car").run(entities_or_all(&args.entities, &prices)?, |entity| {
        model.compute_and_store(entity, &inputs, &store)
    });

    println!("car: {summary}");
    Ok(())
}

fn event_car(config: &PipelineConfig, args: &EventArgs) -> CliResult {
    let aggregator = config.event_window_aggregator()?;
    let events = read_events(&args.events)?;
    let calendar = event_calendar(args.calendar.as_deref(), &events)?;
    let store = ParquetArtifactStore::new(&args.artifacts);

    let results = aggregator.aggregate(&events, &calendar, &store)?;
    if results.is_empty() {
        warn!(events = events.len(), "no event produced a window");
    }
    write_event_windows(&args.output, &results)?;

    println!(
        "event-car: {} of {} events written to {}",
        results.len(),
        events.len(),
        args.output.display()
    );
    Ok(())
}

fn fwd_ret(config: &PipelineConfig, args: &FwdRetArgs) -> CliResult {
    let builder = config.forward_builder();
    let (start, end) = args.range.resolve()?;
    let prices = CsvPriceStore::new(&args.prices);
    let benchmark = prices.prices(args.benchmark, start, end)?;
    info!(benchmark = %args.benchmark, rows = benchmark.len(), "benchmark loaded");

    let store = ParquetArtifactStore::new(&args.output);
    let entities =
        entities_or_all(&args.entities, &prices)?.into_iter().filter(|e| *e != args.benchmark);
    let summary = BatchRunner::new("fwd-ret").run(entities, |entity| {
        builder.build_and_store(entity, &prices, &benchmark, (start, end), &store)
    });

    println!("fwd-ret: {summary}");
    Ok(())
}

fn event_fwd_ret(config: &PipelineConfig, args: &EventArgs) -> CliResult {
    let aggregator = config.forward_aggregator()?;
    let events = read_events(&args.events)?;
    let calendar = event_calendar(args.calendar.as_deref(), &events)?;
    let store = ParquetArtifactStore::new(&args.artifacts);

    let results = aggregator.aggregate(&events, &calendar, &store)?;
    if results.is_empty() {
        warn!(events = events.len(), "no event produced forward returns");
    }
    write_event_forward_returns(&args.output, &results, &config.forward.horizons)?;

    println!(
        "event-fwd-ret: {} of {} events written to {}",
        results.len(),
        events.len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use eventcar::primitives::EventId;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mappings_are_upper_cased() {
        let (symbol, id) = parse_mapping("nvda=32307").unwrap();
        assert_eq!(symbol, "NVDA");
        assert_eq!(id, EntityId::new(32307));
        assert!(parse_mapping("NVDA").is_err());
        assert!(parse_mapping("=1").is_err());
        assert!(parse_mapping("SPY=x").is_err());
    }

    #[test]
    fn car_arguments_parse() {
        let cli = Cli::try_parse_from([
            "eventcar",
            "--log-format",
            "json",
            "car",
            "--prices",
            "p",
            "--output",
            "o",
            "--entities",
            "1,2",
            "--end",
            "2024-06-30",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Car(args) = cli.command else { panic!("expected car") };
        assert_eq!(args.entities, vec![EntityId::new(1), EntityId::new(2)]);
        let (start, end) = args.range.resolve().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let range = RangeArgs {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        assert!(range.resolve().is_err());
    }

    #[test]
    fn event_calendar_spans_the_events() {
        let at = |d: u32, h: u32| EarningsEvent {
            event_id: EventId::new(d.to_string()),
            entity_id: EntityId::new(1),
            timestamp: EventTimestamp::Local(
                NaiveDate::from_ymd_opt(2024, 4, d).unwrap().and_hms_opt(h, 0, 0).unwrap(),
            ),
        };
        // Friday 2024-04-26 after the close opens on Monday the 29th.
        let calendar = event_calendar(None, &[at(26, 17), at(3, 8)]).unwrap();
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();

        assert_eq!(calendar.first(), Some(day(2)));
        assert_eq!(calendar.after(day(26)), Some(day(29)));
        assert!(event_calendar(None, &[]).unwrap().is_empty());
    }

    #[test]
    fn fetch_requires_a_mapping() {
        assert!(Cli::try_parse_from(["eventcar", "fetch-prices", "--prices", "p"]).is_err());
    }
}
