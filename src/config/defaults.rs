/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Storage defaults
pub const DEFAULT_INPUT_PATH: &str = "epgdata_files";
pub const DEFAULT_OUTPUT_PATH: &str = "output";
pub const DEFAULT_OUTPUT_FILE: &str = "epg.xml";
pub const DEFAULT_CHANNEL_FILTER_PATH: &str = "channelfilter";
pub const DEFAULT_RETENTION_ENABLED: bool = true;

// Reference file names inside the include package
pub const CATEGORY_FILE: &str = "category.xml";
pub const GENRE_FILE: &str = "genre.xml";
pub const CHANNEL_FILE: &str = "channel_y.xml";

// epgdata.com defaults
pub const DEFAULT_EPGDATA_BASE_URL: &str = "http://www.epgdata.com";
pub const DEFAULT_EPGDATA_DAYS: u32 = 7;
pub const DEFAULT_FETCH_ENABLED: bool = true;
pub const DEFAULT_HTTP_TIMEOUT: u64 = 120;

// TheTVDB defaults
pub const DEFAULT_TVDB_ENABLED: bool = true;
pub const DEFAULT_TVDB_BASE_URL: &str = "https://api4.thetvdb.com/v4";
pub const DEFAULT_TVDB_LANGUAGE: &str = "deu";
pub const DEFAULT_TVDB_CACHE_CAPACITY: usize = 4096;
pub const DEFAULT_TVDB_TIMEOUT: u64 = 15;

// Output defaults
pub const DEFAULT_GENERATOR_INFO_NAME: &str = "EPGData2XMLTV";
pub const DEFAULT_GENERATOR_INFO_URL: &str = "http://github.com/ortegaangelo/EPGData2XMLTV";
pub const DEFAULT_LANGUAGE: &str = "de";
pub const DEFAULT_DEDUPLICATE_PROGRAMMES: bool = true;
