//! EPGData2XMLTV library
//!
//! Converts epgdata.com schedule packages into a single XMLTV document,
//! optionally enriching episode numbers from TheTVDB.

pub mod config;
pub mod data_mapping;
pub mod errors;
pub mod generator;
pub mod ingestor;
pub mod metadata;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;
