//! Programme mapping: one vendor broadcast record -> one XMLTV `programme`
//!
//! Element order follows the vendor tool this output has always been consumed
//! from: titles, credits, categories, length, episode numbering, countries,
//! date, icon, rating, star rating, premiere.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::lookup::LookupTables;
use crate::errors::{MappingError, MappingResult};
use crate::generator::KnownChannelIds;
use crate::metadata::{EpisodeResolution, EpisodeResolver};
use crate::models::epgdata::codes;
use crate::models::{ProgramRecord, XmlElement};
use crate::utils::UtcOffset;
use crate::utils::time::{format_xmltv_timestamp, parse_source_timestamp};

const NAME_SEPARATOR: char = '|';
const ACTOR_SEPARATOR: &str = ") - ";

fn actor_name_regex() -> &'static Regex {
    static ACTOR_NAME: OnceLock<Regex> = OnceLock::new();
    ACTOR_NAME.get_or_init(|| Regex::new(r"(.*?)\(.*?\)").expect("actor regex should compile"))
}

/// Split a `|`-joined list; an empty field is an empty list
pub fn split_names(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(NAME_SEPARATOR).map(str::to_string).collect()
}

/// Split a `name(role) - name(role)` list into actor names
///
/// The separator swallows the closing parenthesis, so it is put back before
/// the name is taken as everything in front of the first `(...)`. Fragments
/// without a role are used whole; empty names are dropped.
pub fn split_actors(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }

    field
        .split(ACTOR_SEPARATOR)
        .filter_map(|part| {
            let fragment = format!("{part})");
            let name = match actor_name_regex().captures(&fragment) {
                Some(caps) => caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
                None => fragment,
            };
            (!name.is_empty()).then_some(name)
        })
        .collect()
}

/// Parse an integer field; empty means 0
fn parse_number(value: &str, field: &'static str) -> MappingResult<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| MappingError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Numeric fields validated before any element is built
struct ParsedNumbers {
    /// Vendor sequence minus one; absent when the sequence is 0
    fallback_episode: Option<i64>,
    total_rating: i64,
    primetime: i64,
}

impl ParsedNumbers {
    fn parse(record: &ProgramRecord) -> MappingResult<Self> {
        let sequence = parse_number(&record.sequence, codes::SEQUENCE)?;
        let fallback_episode = match sequence {
            0 => None,
            n => Some(n.checked_sub(1).ok_or_else(|| MappingError::InvalidNumber {
                field: codes::SEQUENCE,
                value: record.sequence.clone(),
            })?),
        };

        Ok(Self {
            fallback_episode,
            total_rating: parse_number(&record.total_rating, codes::TOTAL_RATING)?,
            primetime: parse_number(&record.primetime, codes::PRIMETIME)?,
        })
    }
}

pub struct ProgrammeMapper<'a> {
    lookups: &'a LookupTables,
    known_channels: &'a KnownChannelIds,
    resolver: Option<&'a EpisodeResolver>,
    offset: UtcOffset,
    language: &'a str,
}

impl<'a> ProgrammeMapper<'a> {
    pub fn new(
        lookups: &'a LookupTables,
        known_channels: &'a KnownChannelIds,
        offset: UtcOffset,
        language: &'a str,
    ) -> Self {
        Self {
            lookups,
            known_channels,
            resolver: None,
            offset,
            language,
        }
    }

    /// Enable episode enrichment
    pub fn with_resolver(mut self, resolver: &'a EpisodeResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Map one record
    ///
    /// `Ok(None)` when the record's channel was not emitted. A malformed
    /// timestamp or numeric field is an error for this record only.
    pub async fn map_program(&self, record: &ProgramRecord) -> MappingResult<Option<XmlElement>> {
        if !self.known_channels.contains(&record.channel_id) {
            return Ok(None);
        }

        debug!("Mapping programme: {}", record.title);

        let start = parse_source_timestamp(&record.start, codes::START)?;
        let stop = parse_source_timestamp(&record.end, codes::END)?;
        let numbers = ParsedNumbers::parse(record)?;

        let mut programme = XmlElement::new("programme")
            .with_attr("channel", record.channel_id.as_str())
            .with_attr("start", format_xmltv_timestamp(&start, self.offset))
            .with_attr("stop", format_xmltv_timestamp(&stop, self.offset));

        for (name, value) in [
            ("title", &record.title),
            ("sub-title", &record.subtitle),
            ("desc", &record.comment_long),
        ] {
            if !value.is_empty() {
                programme = programme.with_child(self.localized(name, value));
            }
        }

        if let Some(credits) = Self::credits(record) {
            programme = programme.with_child(credits);
        }

        if let Some(category) = self.lookups.categories.get(&record.category_id) {
            programme = programme.with_child(self.localized("category", category));
        }
        if let Some(genre) = self.lookups.genres.get(&record.genre_id) {
            programme = programme.with_child(self.localized("category", genre));
        }

        if !record.duration.is_empty() {
            programme = programme.with_child(
                XmlElement::text_element("length", record.duration.as_str()).with_attr("units", "minutes"),
            );
        }

        if let Some(fallback_episode) = numbers.fallback_episode {
            programme = programme.with_child(self.episode_num(record, fallback_episode).await);
        }

        programme = programme.with_children(
            split_names(&record.country)
                .into_iter()
                .map(|country| XmlElement::text_element("country", country)),
        );

        if !record.year.is_empty() {
            programme = programme.with_child(XmlElement::text_element("date", record.year.as_str()));
        }

        if !record.image_big.is_empty() {
            programme = programme.with_child(XmlElement::new("icon").with_attr("src", record.image_big.as_str()));
        }

        if !record.age_marker.is_empty() {
            programme = programme.with_child(
                XmlElement::new("rating")
                    .with_child(XmlElement::text_element("value", record.age_marker.as_str())),
            );
        }

        if numbers.total_rating > 0 {
            // Vendor rates 1-5, XMLTV gets 0-4 out of 4
            programme = programme.with_child(XmlElement::new("star-rating").with_child(
                XmlElement::text_element("value", format!("{}/4", numbers.total_rating - 1)),
            ));
        }

        if numbers.primetime == 1 {
            programme = programme.with_child(XmlElement::text_element("premiere", "Premiere"));
        }

        Ok(Some(programme))
    }

    fn localized(&self, name: &str, text: &str) -> XmlElement {
        XmlElement::text_element(name, text).with_attr("lang", self.language)
    }

    fn credits(record: &ProgramRecord) -> Option<XmlElement> {
        let directors = split_names(&record.director);
        let actors = split_actors(&record.actor);
        let presenters = split_names(&record.moderator);
        let guests = split_names(&record.studio_guest);

        if directors.is_empty() && actors.is_empty() && presenters.is_empty() && guests.is_empty() {
            return None;
        }

        let people = |role: &'static str, names: Vec<String>| {
            names
                .into_iter()
                .map(move |name| XmlElement::text_element(role, name))
        };

        Some(
            XmlElement::new("credits")
                .with_children(people("director", directors))
                .with_children(people("actor", actors))
                .with_children(people("presenter", presenters))
                .with_children(people("guest", guests)),
        )
    }

    async fn episode_num(&self, record: &ProgramRecord, fallback_episode: i64) -> XmlElement {
        let mut season = String::new();
        let mut episode = fallback_episode.to_string();

        if let Some(resolver) = self.resolver.filter(|_| !record.subtitle.is_empty()) {
            if let EpisodeResolution::Resolved {
                season: resolved_season,
                episode: resolved_episode,
            } = resolver.resolve(&record.title, &record.subtitle).await
            {
                season = resolved_season.to_string();
                episode = resolved_episode.to_string();
            }
        }

        XmlElement::text_element("episode-num", format!("{season}.{episode}."))
            .with_attr("system", "xmltv_ns")
    }
}
