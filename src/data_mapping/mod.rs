//! Mapping of vendor records onto XMLTV elements
//!
//! - [`lookup`]: category and genre id -> name tables
//! - [`channel`]: the channel allow-list and channel element mapping
//! - [`programme`]: the programme element mapping

pub mod channel;
pub mod lookup;
pub mod programme;

pub use channel::{ChannelAllowList, ChannelMapper};
pub use lookup::{LookupTable, LookupTables};
pub use programme::ProgrammeMapper;
