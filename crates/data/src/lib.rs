#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/eventcar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod atomic;

mod calendar;
pub use calendar::{CsvCalendar, WeekdayCalendar};

mod prices;
pub use prices::{CsvPriceStore, read_price_file};

mod yahoo;
pub use yahoo::YahooPriceFetcher;

mod kenfrench;
pub use kenfrench::{
    DiskCacheLoader, FIVE_FACTORS_DAILY, HttpTableLoader, KEN_FRENCH_BASE_URL, KenFrenchFactors,
    MOMENTUM_DAILY, default_cache_dir,
};

mod events;
pub use events::{parse_event_timestamp, read_events};

mod store;
pub use store::{ParquetArtifactStore, ParquetRecord};

mod summary;
pub use summary::{write_event_forward_returns, write_event_windows};

mod error;
pub use error::{DataError, Result};

/// Re-export commonly used types.
pub mod prelude {
    pub use eventcar_traits::{
        ArtifactStore, FactorTableProvider, PriceSeriesProvider, TradingCalendarProvider,
    };

    pub use super::{
        CsvCalendar, CsvPriceStore, DataError, KenFrenchFactors, ParquetArtifactStore,
        YahooPriceFetcher,
    };
}
