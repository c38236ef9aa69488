//! XMLTV document assembly and serialization

pub mod assembler;
pub mod writer;

pub use assembler::{ChannelStage, GeneratorInfo, KnownChannelIds, ProgrammeStage, XmltvDocument};
pub use writer::{render_document, write_document};
