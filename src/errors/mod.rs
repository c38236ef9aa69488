//! Centralized error handling for the EPG conversion pipeline
//!
//! The pipeline distinguishes between errors that end the run (configuration,
//! output) and errors that only affect one record, one file or one enrichment
//! lookup. The latter are logged by the caller and the batch continues.
//!
//! # Error Categories
//!
//! - **Source Errors**: staging packages from the vendor over HTTP
//! - **Mapping Errors**: a single programme record that cannot be converted
//! - **Lookup Errors**: the episode metadata service
//!
//! # Usage
//!
//! ```rust
//! use epgdata2xmltv::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for per-record mapping Results
pub type MappingResult<T> = Result<T, MappingError>;

/// Convenience type alias for episode lookup Results
pub type LookupResult<T> = Result<T, LookupError>;
