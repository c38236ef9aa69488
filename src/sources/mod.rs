//! Vendor source staging
//!
//! Downloads epgdata.com packages and unpacks them into the input directory.

pub mod epgdata;

pub use epgdata::{EpgDataSource, StageOutcome, is_day_staged};
