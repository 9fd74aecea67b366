#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/eventcar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod provider;
pub use provider::{
    FactorTableProvider, PriceSeriesProvider, ProviderError, TableLoader,
    TradingCalendarProvider,
};

mod store;
pub use store::ArtifactStore;

mod estimator;
pub use estimator::{EstimatorError, WindowEstimator};
