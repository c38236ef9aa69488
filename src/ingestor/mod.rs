//! Reading staged vendor files into raw records

pub mod epgdata_reader;

pub use epgdata_reader::{decode_document, parse_records, read_records};
