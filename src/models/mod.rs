pub mod epgdata;
pub mod xmltv;

pub use epgdata::{ChannelRecord, ProgramRecord, RawRecord};
pub use xmltv::XmlElement;
