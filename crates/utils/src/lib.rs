#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/eventcar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod fill;
pub use fill::{forward_fill, next_change, pct_change};

mod align;
pub use align::{ensure_ascending, inner_join_dates, left_join_dates};

mod error;
pub use error::UtilsError;
