#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/eventcar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod returns;
pub use returns::{ReturnSeries, ReturnSeriesBuilder, ReturnSeriesConfig};

mod rolling;
pub use rolling::{
    AlignedObservation, OlsConfig, OlsWindowEstimator, RollingConfig, RollingFactorModel,
    RollingFit, align_with_factors,
};

mod abnormal;
pub use abnormal::{AbnormalReturnModel, EntityInputs, abnormal_returns};

mod timing;
pub use timing::ExchangeClock;

mod event_window;
pub use event_window::{EventWindowAggregator, EventWindowConfig, MiddayPolicy, WindowStart};

mod forward;
pub use forward::{
    EventForwardAggregator, ForwardReturnBuilder, ForwardReturnConfig, ReturnBasis,
};

mod batch;
pub use batch::{BatchRunner, BatchSummary, ComputeOutcome, SkipReason};

mod config;
pub use config::PipelineConfig;

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use eventcar_traits::{ArtifactStore, WindowEstimator};

    pub use super::{
        AbnormalReturnModel, BatchRunner, EventForwardAggregator, EventWindowAggregator,
        ForwardReturnBuilder, ModelError, PipelineConfig, RollingFactorModel,
    };
}
