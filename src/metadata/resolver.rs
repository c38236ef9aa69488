use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::EpisodeLookup;
use crate::errors::LookupError;

const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Result of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeResolution {
    /// 0-based numbers, ready for `xmltv_ns`
    Resolved { season: u32, episode: u32 },
    Unresolved(UnresolvedReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    SeriesNotFound,
    NoMatchingEpisode,
    /// Season or episode 0 (specials) cannot be expressed 0-based
    NotRepresentable,
    ServiceError(String),
    UnexpectedResponse(String),
}

/// Counters collected over a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    pub lookups: usize,
    pub resolved: usize,
    pub cache_hits: usize,
}

/// Canonical series name: the title up to the first `" - "`
pub fn series_name(title: &str) -> &str {
    title.split(" - ").next().unwrap_or(title)
}

/// Candidate episode name: the subtitle up to the first `" / "`
pub fn episode_name(subtitle: &str) -> &str {
    subtitle.split(" / ").next().unwrap_or(subtitle)
}

/// Resolves (series title, episode subtitle) into 0-based season/episode numbers
///
/// Failures never propagate: every outcome is an [`EpisodeResolution`] and
/// the caller falls back to the vendor's sequence number.
pub struct EpisodeResolver {
    lookup: Box<dyn EpisodeLookup>,
    cache: Mutex<LruCache<(String, String), EpisodeResolution>>,
    lookups: AtomicUsize,
    resolved: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl EpisodeResolver {
    pub fn new(lookup: Box<dyn EpisodeLookup>) -> Self {
        Self::with_cache_capacity(lookup, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(lookup: Box<dyn EpisodeLookup>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            lookup,
            cache: Mutex::new(LruCache::new(capacity)),
            lookups: AtomicUsize::new(0),
            resolved: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    pub async fn resolve(&self, title: &str, subtitle: &str) -> EpisodeResolution {
        let series = series_name(title);
        let episode = episode_name(subtitle);
        let key = (series.to_string(), episode.to_string());

        if let Some(cached) = self.cache.lock().await.get(&key).cloned() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            self.count(&cached);
            return cached;
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let resolution = match self.lookup.search(series, episode).await {
            Ok(matches) => match matches.first() {
                Some(found) => match (found.season.checked_sub(1), found.episode.checked_sub(1)) {
                    (Some(season), Some(episode)) => {
                        debug!("episode: {}.{}.{}.{}", title, subtitle, season, episode);
                        EpisodeResolution::Resolved { season, episode }
                    }
                    _ => {
                        debug!(
                            "Episode {}x{} of {} has no 0-based numbering",
                            found.season, found.episode, series
                        );
                        EpisodeResolution::Unresolved(UnresolvedReason::NotRepresentable)
                    }
                },
                None => {
                    debug!("No episode named '{}' in '{}'", episode, series);
                    EpisodeResolution::Unresolved(UnresolvedReason::NoMatchingEpisode)
                }
            },
            Err(LookupError::SeriesNotFound { .. }) => {
                info!("Could not find episode for: {}.{}", title, subtitle);
                EpisodeResolution::Unresolved(UnresolvedReason::SeriesNotFound)
            }
            Err(LookupError::Service { message }) => {
                error!("tvdb error: {}.{}: {}", title, subtitle, message);
                EpisodeResolution::Unresolved(UnresolvedReason::ServiceError(message))
            }
            Err(LookupError::UnexpectedResponse { message }) => {
                error!("Mapping key not found: {}.{}: {}", title, subtitle, message);
                EpisodeResolution::Unresolved(UnresolvedReason::UnexpectedResponse(message))
            }
        };

        // Service errors may be transient, everything else holds for the run
        if !matches!(
            resolution,
            EpisodeResolution::Unresolved(UnresolvedReason::ServiceError(_))
        ) {
            self.cache.lock().await.put(key, resolution.clone());
        }

        self.count(&resolution);
        resolution
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    fn count(&self, resolution: &EpisodeResolution) {
        if matches!(resolution, EpisodeResolution::Resolved { .. }) {
            self.resolved.fetch_add(1, Ordering::Relaxed);
        }
    }
}
