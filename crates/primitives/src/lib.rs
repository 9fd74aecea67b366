#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/eventcar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod entity;
pub use entity::EntityId;

mod prices;
pub use prices::PriceObservation;

mod calendar;
pub use calendar::TradingCalendar;

mod factor;
pub use factor::{FactorLoadings, FactorName, FactorObservation, FactorTable, N_FACTORS};

mod returns;
pub use returns::{AbnormalReturnObservation, ReturnObservation};

mod event;
pub use event::{EarningsEvent, EventId, EventTimestamp, EventWindowResult, Horizon};

mod forward;
pub use forward::{EventForwardReturn, ForwardHorizonReturn, ForwardReturnObservation};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
