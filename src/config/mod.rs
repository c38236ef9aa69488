use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub epgdata: EpgDataConfig,
    #[serde(default)]
    pub tvdb: TvdbConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory the vendor packages are staged into
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,
    /// Directory the XMLTV document is written to
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// One allowed channel display name per line
    #[serde(default = "default_channel_filter_path")]
    pub channel_filter_path: PathBuf,
    /// Delete staged daily files older than yesterday before fetching
    #[serde(default = "default_retention_enabled")]
    pub retention_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpgDataConfig {
    #[serde(default = "default_epgdata_base_url")]
    pub base_url: String,
    /// Subscriber pin; fetching is skipped when empty
    #[serde(default)]
    pub pin: String,
    /// Number of daily packages to fetch, starting today
    #[serde(default = "default_epgdata_days")]
    pub days: u32,
    #[serde(default = "default_fetch_enabled")]
    pub fetch_enabled: bool,
    /// Total request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvdbConfig {
    #[serde(default = "default_tvdb_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    /// Subscriber pin for user-supported keys
    #[serde(default)]
    pub pin: Option<String>,
    /// Three-letter language code used for episode names
    #[serde(default = "default_tvdb_language")]
    pub language: String,
    #[serde(default = "default_tvdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tvdb_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_tvdb_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_generator_info_name")]
    pub generator_info_name: String,
    #[serde(default = "default_generator_info_url")]
    pub generator_info_url: String,
    /// Value of the `lang` attribute on text elements
    #[serde(default = "default_language")]
    pub language: String,
    /// IANA timezone for the offset; the host's local offset when unset
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_deduplicate_programmes")]
    pub deduplicate_programmes: bool,
}

// Storage defaults
fn default_input_path() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_PATH)
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

fn default_channel_filter_path() -> PathBuf {
    PathBuf::from(DEFAULT_CHANNEL_FILTER_PATH)
}

fn default_retention_enabled() -> bool {
    DEFAULT_RETENTION_ENABLED
}

// epgdata defaults
fn default_epgdata_base_url() -> String {
    DEFAULT_EPGDATA_BASE_URL.to_string()
}

fn default_epgdata_days() -> u32 {
    DEFAULT_EPGDATA_DAYS
}

fn default_fetch_enabled() -> bool {
    DEFAULT_FETCH_ENABLED
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT
}

// TheTVDB defaults
fn default_tvdb_enabled() -> bool {
    DEFAULT_TVDB_ENABLED
}

fn default_tvdb_language() -> String {
    DEFAULT_TVDB_LANGUAGE.to_string()
}

fn default_tvdb_base_url() -> String {
    DEFAULT_TVDB_BASE_URL.to_string()
}

fn default_tvdb_cache_capacity() -> usize {
    DEFAULT_TVDB_CACHE_CAPACITY
}

fn default_tvdb_timeout() -> u64 {
    DEFAULT_TVDB_TIMEOUT
}

// Output defaults
fn default_generator_info_name() -> String {
    DEFAULT_GENERATOR_INFO_NAME.to_string()
}

fn default_generator_info_url() -> String {
    DEFAULT_GENERATOR_INFO_URL.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_deduplicate_programmes() -> bool {
    DEFAULT_DEDUPLICATE_PROGRAMMES
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            output_file: default_output_file(),
            channel_filter_path: default_channel_filter_path(),
            retention_enabled: default_retention_enabled(),
        }
    }
}

impl Default for EpgDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_epgdata_base_url(),
            pin: String::new(),
            days: default_epgdata_days(),
            fetch_enabled: default_fetch_enabled(),
            timeout: default_http_timeout(),
        }
    }
}

impl Default for TvdbConfig {
    fn default() -> Self {
        Self {
            enabled: default_tvdb_enabled(),
            api_key: String::new(),
            pin: None,
            language: default_tvdb_language(),
            base_url: default_tvdb_base_url(),
            cache_capacity: default_tvdb_cache_capacity(),
            timeout: default_tvdb_timeout(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generator_info_name: default_generator_info_name(),
            generator_info_url: default_generator_info_url(),
            language: default_language(),
            timezone: None,
            deduplicate_programmes: default_deduplicate_programmes(),
        }
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Full path of the generated XMLTV document
    pub fn output_file_path(&self) -> PathBuf {
        self.storage.output_path.join(&self.storage.output_file)
    }

    /// Episode enrichment needs both the switch and a key
    pub fn enrichment_enabled(&self) -> bool {
        self.tvdb.enabled && !self.tvdb.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [epgdata]
            pin = "secret"

            [output]
            timezone = "Europe/Berlin"
            "#,
        )
        .unwrap();

        assert_eq!(config.epgdata.pin, "secret");
        assert_eq!(config.epgdata.days, DEFAULT_EPGDATA_DAYS);
        assert_eq!(config.storage.input_path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(config.output.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(config.output.language, "de");
        assert!(config.output.deduplicate_programmes);
    }

    #[test]
    fn test_enrichment_requires_api_key() {
        let mut config = Config::default();
        assert!(!config.enrichment_enabled());

        config.tvdb.api_key = "key".to_string();
        assert!(config.enrichment_enabled());

        config.tvdb.enabled = false;
        assert!(!config.enrichment_enabled());
    }

    #[test]
    fn test_load_from_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let config = Config::load_from_file(path).unwrap();
        assert_eq!(config.storage.output_file, DEFAULT_OUTPUT_FILE);
        assert!(std::path::Path::new(path).exists());

        let reloaded = Config::load_from_file(path).unwrap();
        assert_eq!(reloaded.output.generator_info_name, DEFAULT_GENERATOR_INFO_NAME);
    }
}
