//! # eventcar
//!
//! Cumulative abnormal returns around earnings announcements.
//!
//! This crate provides a unified interface to the eventcar pipeline crates.
//! Individual components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core record types
//! - `traits`: Provider and store abstractions
//! - `math`: Least squares and compounding
//! - `utils`: Calendar alignment and joins
//! - `model`: Abnormal returns, event windows and forward returns
//! - `data`: File, Yahoo Finance and Ken French sources, Parquet storage
//! - `cli`: The `eventcar` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventcar::data::{ParquetArtifactStore, read_events};
//! use eventcar::model::EventWindowAggregator;
//! use eventcar::primitives::TradingCalendar;
//!
//! let events = read_events("events.csv".as_ref())?;
//! let calendar = TradingCalendar::weekdays(start, end, &[]);
//! let store = ParquetArtifactStore::new("car");
//! let windows = EventWindowAggregator::new().aggregate(&events, &calendar, &store)?;
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/eventcar/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use eventcar_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use eventcar_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use eventcar_math as math;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use eventcar_utils as utils;
#[cfg(feature = "model")]
#[doc(inline)]
pub use eventcar_model as model;
#[cfg(feature = "data")]
#[doc(inline)]
pub use eventcar_data as data;
