//! Services orchestrating a conversion run

pub mod conversion;

pub use conversion::{ConversionService, ConversionStats, RunOptions, list_program_files};
