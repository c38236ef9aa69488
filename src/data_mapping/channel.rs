use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::errors::AppResult;
use crate::models::{ChannelRecord, XmlElement};

/// Channel display names permitted in the output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelAllowList {
    names: HashSet<String>,
}

impl ChannelAllowList {
    /// One name per line; blank lines are ignored, everything else is matched exactly
    pub fn from_lines(content: &str) -> Self {
        let names = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&content))
    }

    pub fn is_allowed(&self, channel_name: &str) -> bool {
        self.names.contains(channel_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ChannelAllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Turns allow-listed channel records into `channel` elements
pub struct ChannelMapper<'a> {
    allow_list: &'a ChannelAllowList,
    language: &'a str,
}

impl<'a> ChannelMapper<'a> {
    pub fn new(allow_list: &'a ChannelAllowList, language: &'a str) -> Self {
        Self {
            allow_list,
            language,
        }
    }

    /// `None` when the channel's display name is not allow-listed
    pub fn map_channel(&self, record: &ChannelRecord) -> Option<XmlElement> {
        if !self.allow_list.is_allowed(&record.display_name) {
            return None;
        }

        debug!("Mapping channel: {}", record.display_name);

        let mut channel = XmlElement::new("channel").with_attr("id", record.source_channel_id.as_str());
        if !record.display_name.is_empty() {
            channel = channel.with_child(
                XmlElement::text_element("display-name", record.display_name.as_str())
                    .with_attr("lang", self.language),
            );
        }

        Some(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> ChannelRecord {
        ChannelRecord {
            source_channel_id: id.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_allow_list_exact_match() {
        let allow_list = ChannelAllowList::from_lines("Das Erste\nZDF\n\n3sat\n");
        assert_eq!(allow_list.len(), 3);
        assert!(allow_list.is_allowed("ZDF"));
        assert!(!allow_list.is_allowed("zdf"));
        assert!(!allow_list.is_allowed("ZDF "));
        assert!(!allow_list.is_allowed(""));
    }

    #[test]
    fn test_allow_list_handles_crlf() {
        let allow_list = ChannelAllowList::from_lines("Das Erste\r\nZDF\r\n");
        assert!(allow_list.is_allowed("Das Erste"));
        assert!(allow_list.is_allowed("ZDF"));
    }

    #[test]
    fn test_map_channel() {
        let allow_list: ChannelAllowList = ["Das Erste"].into_iter().collect();
        let mapper = ChannelMapper::new(&allow_list, "de");

        let channel = mapper.map_channel(&record("1", "Das Erste")).unwrap();
        assert_eq!(channel.name, "channel");
        assert_eq!(channel.attr("id"), Some("1"));

        let display_name = channel.child("display-name").unwrap();
        assert_eq!(display_name.text(), Some("Das Erste"));
        assert_eq!(display_name.attr("lang"), Some("de"));

        assert!(mapper.map_channel(&record("2", "ZDF")).is_none());
    }
}
