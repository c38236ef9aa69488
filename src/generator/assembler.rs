use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::models::XmlElement;

/// Ids of every channel element emitted so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownChannelIds {
    ids: HashSet<String>,
}

impl KnownChannelIds {
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownChannelIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Attributes of the root `tv` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorInfo {
    pub name: String,
    pub url: String,
}

impl GeneratorInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// First assembly stage: only channels can be added
///
/// Programmes need the final set of channel ids, so they are only accepted
/// once [`ChannelStage::into_programmes`] has closed the channel list.
#[derive(Debug)]
pub struct ChannelStage {
    info: GeneratorInfo,
    channels: Vec<XmlElement>,
    known: KnownChannelIds,
}

impl ChannelStage {
    pub fn new(info: GeneratorInfo) -> Self {
        Self {
            info,
            channels: Vec::new(),
            known: KnownChannelIds::default(),
        }
    }

    /// Add a channel element; `false` if its id was already emitted
    pub fn push_channel(&mut self, channel: XmlElement) -> bool {
        let Some(id) = channel.attr("id") else {
            debug!("Ignoring channel element without id");
            return false;
        };

        if !self.known.insert(id) {
            debug!("Skipping duplicate channel id {}", id);
            return false;
        }

        self.channels.push(channel);
        true
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn into_programmes(self, deduplicate: bool) -> ProgrammeStage {
        ProgrammeStage {
            info: self.info,
            channels: self.channels,
            known: Arc::new(self.known),
            programmes: Vec::new(),
            seen: HashSet::new(),
            deduplicate,
        }
    }
}

/// Second assembly stage: the channel list is frozen, programmes are appended
#[derive(Debug)]
pub struct ProgrammeStage {
    info: GeneratorInfo,
    channels: Vec<XmlElement>,
    known: Arc<KnownChannelIds>,
    programmes: Vec<XmlElement>,
    seen: HashSet<(String, String)>,
    deduplicate: bool,
}

impl ProgrammeStage {
    pub fn known_channels(&self) -> Arc<KnownChannelIds> {
        Arc::clone(&self.known)
    }

    /// Add a programme; `false` when it repeats an earlier (channel, start)
    pub fn push_programme(&mut self, programme: XmlElement) -> bool {
        if self.deduplicate {
            let key = (
                programme.attr("channel").unwrap_or_default().to_string(),
                programme.attr("start").unwrap_or_default().to_string(),
            );
            if !self.seen.insert(key) {
                return false;
            }
        }

        self.programmes.push(programme);
        true
    }

    pub fn programme_count(&self) -> usize {
        self.programmes.len()
    }

    pub fn finish(self) -> XmltvDocument {
        let root = XmlElement::new("tv")
            .with_attr("generator-info-name", self.info.name)
            .with_attr("generator-info-url", self.info.url)
            .with_children(self.channels)
            .with_children(self.programmes);

        XmltvDocument { root }
    }
}

/// A finished document: `tv` root, channels first, then programmes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmltvDocument {
    pub root: XmlElement,
}

impl XmltvDocument {
    pub fn channels(&self) -> impl Iterator<Item = &XmlElement> {
        self.root.children_named("channel")
    }

    pub fn programmes(&self) -> impl Iterator<Item = &XmlElement> {
        self.root.children_named("programme")
    }
}
