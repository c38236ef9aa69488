//! Utility helpers shared by the pipeline stages
//!
//! - `time` for the run-wide UTC offset and timestamp rendering
//! - `decompression` for unpacking vendor archives
//! - `retention` for pruning stale staged files

pub mod decompression;
pub mod retention;
pub mod time;

pub use decompression::{ArchiveEntry, CompressionFormat, DecompressionService};
pub use retention::{RetentionReport, cleanup_staged_files};
pub use time::UtcOffset;
