//! TheTVDB v4 client
//!
//! Only the calls needed for episode lookups are implemented: login, series
//! search and the paged episode list of a series in the configured language.

use async_trait::async_trait;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{EpisodeLookup, EpisodeMatch};
use crate::config::TvdbConfig;
use crate::errors::{AppResult, LookupError, LookupResult};

/// Upper bound on episode pages fetched for one series
const MAX_EPISODE_PAGES: u32 = 50;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Links {
    next: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    apikey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    tvdb_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EpisodesPage {
    #[serde(default)]
    episodes: Vec<TvdbEpisode>,
}

/// Episode record as returned by `/series/{id}/episodes`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TvdbEpisode {
    pub name: Option<String>,
    #[serde(rename = "seasonNumber")]
    pub season_number: Option<u32>,
    pub number: Option<u32>,
}

/// Episodes whose name contains `query` (case-insensitive), ordered by season and number
///
/// Specials (season or number 0) sort after regular episodes. A matching
/// episode without numbering is reported as an unexpected response.
pub fn match_episodes(episodes: &[TvdbEpisode], query: &str) -> LookupResult<Vec<EpisodeMatch>> {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();

    for episode in episodes {
        let Some(name) = episode.name.as_deref() else {
            continue;
        };
        if !name.to_lowercase().contains(&needle) {
            continue;
        }

        match (episode.season_number, episode.number) {
            (Some(season), Some(number)) => matches.push(EpisodeMatch {
                name: name.to_string(),
                season,
                episode: number,
            }),
            _ => {
                return Err(LookupError::unexpected(format!(
                    "episode '{name}' has no seasonNumber/number"
                )));
            }
        }
    }

    matches.sort_by_key(|m| (m.season == 0 || m.episode == 0, m.season, m.episode));
    Ok(matches)
}

pub struct TvdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    pin: Option<String>,
    language: String,
    token: Mutex<Option<String>>,
    episodes: Mutex<LruCache<String, LookupResult<Arc<Vec<TvdbEpisode>>>>>,
}

impl TvdbClient {
    pub fn new(config: &TvdbConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            pin: config.pin.clone().filter(|p| !p.is_empty()),
            language: config.language.clone(),
            token: Mutex::new(None),
            episodes: Mutex::new(LruCache::new(capacity)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self) -> LookupResult<String> {
        let request = LoginRequest {
            apikey: &self.api_key,
            pin: self.pin.as_deref(),
        };

        let response = self
            .client
            .post(self.url("/login"))
            .json(&request)
            .send()
            .await?;

        let body: ApiResponse<LoginData> = Self::handle_response(response).await?;
        let data = body
            .data
            .ok_or_else(|| LookupError::unexpected("login response without data"))?;
        debug!("Logged in to TheTVDB");
        Ok(data.token)
    }

    async fn token(&self) -> LookupResult<String> {
        let mut token = self.token.lock().await;
        if let Some(existing) = token.as_ref() {
            return Ok(existing.clone());
        }
        let fresh = self.login().await?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> LookupResult<ApiResponse<T>> {
        let token = self.token().await?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Tokens expire after a month; log in again on the next call
            self.token.lock().await.take();
        }

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> LookupResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LookupError::service(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }
        Ok(response.json().await?)
    }

    async fn find_series_id(&self, series_name: &str) -> LookupResult<String> {
        let body: ApiResponse<Vec<SearchResult>> = self
            .get(
                "/search",
                &[
                    ("query", series_name.to_string()),
                    ("type", "series".to_string()),
                ],
            )
            .await?;

        let first = body
            .data
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| LookupError::SeriesNotFound {
                series: series_name.to_string(),
            })?;

        let id = first
            .tvdb_id
            .ok_or_else(|| LookupError::unexpected("search result without tvdb_id"))?;
        debug!(
            "Series '{}' matched '{}' ({})",
            series_name,
            first.name.unwrap_or_default(),
            id
        );
        Ok(id)
    }

    async fn fetch_episodes(&self, series_id: &str) -> LookupResult<Vec<TvdbEpisode>> {
        let path = format!("/series/{}/episodes/default/{}", series_id, self.language);
        let mut episodes = Vec::new();

        for page in 0..MAX_EPISODE_PAGES {
            let body: ApiResponse<EpisodesPage> = self.get(&path, &[("page", page.to_string())]).await?;
            let data = body
                .data
                .ok_or_else(|| LookupError::unexpected("episode list without data"))?;
            episodes.extend(data.episodes);

            let has_next = body
                .links
                .and_then(|links| links.next)
                .is_some_and(|next| !next.is_null());
            if !has_next {
                break;
            }
        }

        debug!("Fetched {} episodes for series {}", episodes.len(), series_id);
        Ok(episodes)
    }

    async fn series_episodes(&self, series_name: &str) -> LookupResult<Arc<Vec<TvdbEpisode>>> {
        if let Some(cached) = self.episodes.lock().await.get(series_name).cloned() {
            return cached;
        }

        let result = match self.find_series_id(series_name).await {
            Ok(id) => self.fetch_episodes(&id).await.map(Arc::new),
            Err(e) => Err(e),
        };

        if !matches!(result, Err(LookupError::Service { .. })) {
            self.episodes
                .lock()
                .await
                .put(series_name.to_string(), result.clone());
        }

        result
    }
}

#[async_trait]
impl EpisodeLookup for TvdbClient {
    async fn search(&self, series_name: &str, episode_name: &str) -> LookupResult<Vec<EpisodeMatch>> {
        let episodes = self.series_episodes(series_name).await?;
        match_episodes(&episodes, episode_name)
    }
}
