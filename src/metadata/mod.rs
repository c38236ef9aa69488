//! Episode metadata enrichment
//!
//! The vendor only ships a running sequence number per broadcast. When a
//! programme carries an episode subtitle, the [`EpisodeResolver`] asks an
//! [`EpisodeLookup`] service (TheTVDB in production) for the real season and
//! episode numbers.

pub mod resolver;
pub mod tvdb;

pub use resolver::{EpisodeResolution, EpisodeResolver, ResolverStats, UnresolvedReason};
pub use tvdb::TvdbClient;

use async_trait::async_trait;

use crate::errors::LookupResult;

/// An episode as reported by the metadata service, numbers 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    pub name: String,
    pub season: u32,
    pub episode: u32,
}

/// Keyed episode search against an external metadata service
#[async_trait]
pub trait EpisodeLookup: Send + Sync {
    /// Episodes of `series_name` whose name matches `episode_name`, best first
    async fn search(&self, series_name: &str, episode_name: &str) -> LookupResult<Vec<EpisodeMatch>>;
}
