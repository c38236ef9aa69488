//! Records of the epgdata.com "vdr" export
//!
//! Every file of a package is a flat list of `<data>` records whose children are
//! named by short field codes. [`RawRecord`] keeps those as-is; the typed
//! records below pick the codes each pipeline stage needs.

use std::collections::HashMap;

/// Field codes used by the vendor schema
pub mod codes {
    // channel_y.xml
    pub const CHANNEL_NAME: &str = "ch0";
    pub const CHANNEL_SOURCE_ID: &str = "ch4";

    // category.xml / genre.xml
    pub const CATEGORY_ID: &str = "ca0";
    pub const CATEGORY_NAME: &str = "ca1";
    pub const GENRE_ID: &str = "g0";
    pub const GENRE_NAME: &str = "g1";

    // daily packages
    pub const PROGRAM_CHANNEL_ID: &str = "d2";
    pub const START: &str = "d4";
    pub const END: &str = "d5";
    pub const DURATION: &str = "d7";
    pub const PRIMETIME: &str = "d9";
    pub const PROGRAM_CATEGORY_ID: &str = "d10";
    pub const AGE_MARKER: &str = "d16";
    pub const TITLE: &str = "d19";
    pub const SUBTITLE: &str = "d20";
    pub const COMMENT_LONG: &str = "d21";
    pub const PROGRAM_GENRE_ID: &str = "d25";
    pub const SEQUENCE: &str = "d26";
    pub const TOTAL_RATING: &str = "d30";
    pub const COUNTRY: &str = "d32";
    pub const YEAR: &str = "d33";
    pub const MODERATOR: &str = "d34";
    pub const STUDIO_GUEST: &str = "d35";
    pub const DIRECTOR: &str = "d36";
    pub const ACTOR: &str = "d37";
    pub const IMAGE_BIG: &str = "d40";
}

/// One `<data>` record: field code -> text content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, code: K, value: V) {
        self.fields.insert(code.into(), value.into());
    }

    /// Builder-style insert, handy for constructing fixtures
    pub fn with<K: Into<String>, V: Into<String>>(mut self, code: K, value: V) -> Self {
        self.insert(code, value);
        self
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.fields.get(code).map(String::as_str)
    }

    /// Text of a field, empty when the field is missing
    pub fn text(&self, code: &str) -> &str {
        self.get(code).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A channel from `channel_y.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub source_channel_id: String,
    pub display_name: String,
}

impl From<&RawRecord> for ChannelRecord {
    fn from(raw: &RawRecord) -> Self {
        Self {
            source_channel_id: raw.text(codes::CHANNEL_SOURCE_ID).to_string(),
            display_name: raw.text(codes::CHANNEL_NAME).to_string(),
        }
    }
}

/// A broadcast from a daily package
///
/// Values are kept as the vendor delivers them; parsing and splitting happen
/// in the programme mapper so a bad field only affects its own record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramRecord {
    pub channel_id: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub primetime: String,
    pub category_id: String,
    pub age_marker: String,
    pub title: String,
    pub subtitle: String,
    pub comment_long: String,
    pub genre_id: String,
    pub sequence: String,
    pub total_rating: String,
    pub country: String,
    pub year: String,
    pub moderator: String,
    pub studio_guest: String,
    pub director: String,
    pub actor: String,
    pub image_big: String,
}

impl From<&RawRecord> for ProgramRecord {
    fn from(raw: &RawRecord) -> Self {
        let field = |code: &str| raw.text(code).to_string();
        Self {
            channel_id: field(codes::PROGRAM_CHANNEL_ID),
            start: field(codes::START),
            end: field(codes::END),
            duration: field(codes::DURATION),
            primetime: field(codes::PRIMETIME),
            category_id: field(codes::PROGRAM_CATEGORY_ID),
            age_marker: field(codes::AGE_MARKER),
            title: field(codes::TITLE),
            subtitle: field(codes::SUBTITLE),
            comment_long: field(codes::COMMENT_LONG),
            genre_id: field(codes::PROGRAM_GENRE_ID),
            sequence: field(codes::SEQUENCE),
            total_rating: field(codes::TOTAL_RATING),
            country: field(codes::COUNTRY),
            year: field(codes::YEAR),
            moderator: field(codes::MODERATOR),
            studio_guest: field(codes::STUDIO_GUEST),
            director: field(codes::DIRECTOR),
            actor: field(codes::ACTOR),
            image_big: field(codes::IMAGE_BIG),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_read_as_empty() {
        let raw = RawRecord::new()
            .with(codes::PROGRAM_CHANNEL_ID, "42")
            .with(codes::TITLE, "Tatort");

        let program = ProgramRecord::from(&raw);
        assert_eq!(program.channel_id, "42");
        assert_eq!(program.title, "Tatort");
        assert_eq!(program.subtitle, "");
        assert_eq!(program.sequence, "");
    }

    #[test]
    fn test_channel_record_from_raw() {
        let raw = RawRecord::new()
            .with(codes::CHANNEL_NAME, "Das Erste")
            .with(codes::CHANNEL_SOURCE_ID, "1");

        let channel = ChannelRecord::from(&raw);
        assert_eq!(channel.display_name, "Das Erste");
        assert_eq!(channel.source_channel_id, "1");
    }
}
