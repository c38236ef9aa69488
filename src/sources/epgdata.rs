//! epgdata.com package fetching
//!
//! Reference files (`sendInclude`) and daily packages (`sendPackage`) are
//! delivered as zip archives. Every entry is written into the input directory
//! under its bare file name.

use bytes::Bytes;
use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EpgDataConfig;
use crate::errors::{AppResult, SourceError};
use crate::utils::{CompressionFormat, DecompressionService};

const ZIP_CONTENT_TYPE: &str = "application/x-zip-compressed";
const OEM: &str = "vdr";
const DATA_TYPE: &str = "xml";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const STAGED_DATE_FORMAT: &str = "%Y%m%d";

/// What a package fetch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Files written, by name
    Staged(Vec<String>),
    /// A file for that day already existed; nothing was requested
    AlreadyStaged,
}

/// Whether a staged file for `date` exists in `dir`
pub fn is_day_staged(dir: &Path, date: NaiveDate) -> std::io::Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }

    let prefix = date.format(STAGED_DATE_FORMAT).to_string();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Accept the vendor's zip content type, or anything that sniffs as zip
fn is_archive_response(content_type: Option<&str>, body: &[u8]) -> bool {
    let declared = content_type
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(ZIP_CONTENT_TYPE))
        .unwrap_or(false);

    declared || DecompressionService::detect_compression_format(body) == CompressionFormat::Zip
}

pub struct EpgDataSource {
    client: Client,
    endpoint: String,
    pin: String,
    input_dir: PathBuf,
}

impl EpgDataSource {
    pub fn new(config: &EpgDataConfig, input_dir: impl Into<PathBuf>) -> AppResult<Self> {
        if config.pin.trim().is_empty() {
            return Err(SourceError::InvalidConfig {
                field: "epgdata.pin".to_string(),
                message: "a subscriber pin is required to fetch packages".to_string(),
            }
            .into());
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("EPGData2XMLTV/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/index.php", config.base_url.trim_end_matches('/')),
            pin: config.pin.clone(),
            input_dir: input_dir.into(),
        })
    }

    /// Fetch the reference files (channels, categories, genres)
    pub async fn fetch_include(&self) -> AppResult<Vec<String>> {
        info!("Fetching epgdata reference files");
        let body = self.request(&[("action", "sendInclude".to_string())]).await?;
        self.stage_archive(body)
    }

    /// Fetch the package for `today + day_offset` unless it is already staged
    pub async fn fetch_package(&self, day_offset: u32, today: NaiveDate) -> AppResult<StageOutcome> {
        let day = today + ChronoDuration::days(i64::from(day_offset));
        if is_day_staged(&self.input_dir, day)? {
            info!("Package for {} already fetched", day);
            return Ok(StageOutcome::AlreadyStaged);
        }

        info!("Fetching epgdata package dayOffset={} ({})", day_offset, day);
        let body = self
            .request(&[
                ("action", "sendPackage".to_string()),
                ("dayOffset", day_offset.to_string()),
            ])
            .await?;
        self.stage_archive(body).map(StageOutcome::Staged)
    }

    async fn request(&self, params: &[(&str, String)]) -> AppResult<Bytes> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .query(&[("iOEM", OEM), ("pin", self.pin.as_str()), ("dataType", DATA_TYPE)])
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        debug!("epgdata responded {} with content type {:?}", status, content_type);

        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            }
            .into());
        }

        let body = response.bytes().await?;
        if !is_archive_response(content_type.as_deref(), &body) {
            return Err(SourceError::UnexpectedContentType {
                content_type: content_type.unwrap_or_else(|| "none".to_string()),
            }
            .into());
        }

        Ok(body)
    }

    /// Unpack an archive into the input directory
    pub fn stage_archive(&self, body: Bytes) -> AppResult<Vec<String>> {
        let entries = DecompressionService::extract_zip(body)
            .map_err(|e| SourceError::archive(format!("{e:#}")))?;

        std::fs::create_dir_all(&self.input_dir)?;

        let mut staged = Vec::with_capacity(entries.len());
        for entry in entries {
            let target = self.input_dir.join(&entry.name);
            std::fs::write(&target, &entry.contents)?;
            debug!("Staged {} ({} bytes)", target.display(), entry.contents.len());
            staged.push(entry.name);
        }

        info!("Staged {} files into {}", staged.len(), self.input_dir.display());
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn config(pin: &str) -> EpgDataConfig {
        EpgDataConfig {
            pin: pin.to_string(),
            ..Default::default()
        }
    }

    fn archive(files: &[(&str, &str)]) -> Bytes {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    #[test]
    fn test_missing_pin_is_rejected() {
        let result = EpgDataSource::new(&config("  "), "/tmp/unused");
        assert!(matches!(
            result,
            Err(AppError::Source(SourceError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn test_stage_archive_writes_bare_names() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("input");
        let source = EpgDataSource::new(&config("secret"), &input).unwrap();

        let staged = source
            .stage_archive(archive(&[
                ("20240301_1234_de_qy.xml", "<pack/>"),
                ("include/genre.xml", "<genre/>"),
            ]))
            .unwrap();

        assert_eq!(staged, vec!["20240301_1234_de_qy.xml", "genre.xml"]);
        assert_eq!(
            std::fs::read_to_string(input.join("genre.xml")).unwrap(),
            "<genre/>"
        );
        assert!(!input.join("include").exists());
    }

    #[test]
    fn test_stage_archive_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let source = EpgDataSource::new(&config("secret"), temp.path()).unwrap();

        let result = source.stage_archive(Bytes::from_static(b"not a zip"));
        assert!(matches!(result, Err(AppError::Source(SourceError::Archive { .. }))));
    }

    #[tokio::test]
    async fn test_fetch_package_skips_staged_day() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("20240302_0000_de_qy.xml"), "<pack/>").unwrap();

        // The endpoint is never contacted for a staged day
        let mut cfg = config("secret");
        cfg.base_url = "http://127.0.0.1:9".to_string();
        let source = EpgDataSource::new(&cfg, temp.path()).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            source.fetch_package(1, today).await.unwrap(),
            StageOutcome::AlreadyStaged
        );
    }

    #[test]
    fn test_is_day_staged() {
        let temp = TempDir::new().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(!is_day_staged(temp.path(), day).unwrap());
        std::fs::write(temp.path().join("20240301_1234_de_qy.xml"), "").unwrap();
        assert!(is_day_staged(temp.path(), day).unwrap());
        assert!(!is_day_staged(temp.path(), day.succ_opt().unwrap()).unwrap());
        assert!(!is_day_staged(&temp.path().join("missing"), day).unwrap());
    }

    #[test]
    fn test_archive_response_detection() {
        let zip = archive(&[("a.xml", "<a/>")]);

        assert!(is_archive_response(Some("application/x-zip-compressed"), b""));
        assert!(is_archive_response(Some("application/x-zip-compressed; charset=binary"), b""));
        assert!(is_archive_response(Some("application/octet-stream"), &zip));
        assert!(!is_archive_response(Some("text/html"), b"<html>invalid pin</html>"));
        assert!(!is_archive_response(None, b""));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn source(server: &MockServer, input: &Path) -> EpgDataSource {
            let mut cfg = config("secret");
            cfg.base_url = server.uri();
            EpgDataSource::new(&cfg, input).unwrap()
        }

        fn vendor_request(action: &'static str) -> wiremock::MockBuilder {
            Mock::given(method("GET"))
                .and(path("/index.php"))
                .and(query_param("action", action))
                .and(query_param("iOEM", "vdr"))
                .and(query_param("pin", "secret"))
                .and(query_param("dataType", "xml"))
                .and(header("cache-control", "no-cache"))
        }

        #[tokio::test]
        async fn test_fetch_include_stages_archive() {
            let server = MockServer::start().await;
            let body = archive(&[("genre.xml", "<genre/>"), ("category.xml", "<category/>")]);
            vendor_request("sendInclude")
                .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), ZIP_CONTENT_TYPE))
                .expect(1)
                .mount(&server)
                .await;

            let temp = TempDir::new().unwrap();
            let staged = source(&server, temp.path()).fetch_include().await.unwrap();

            assert_eq!(staged, vec!["genre.xml", "category.xml"]);
            assert!(temp.path().join("category.xml").exists());
        }

        #[tokio::test]
        async fn test_fetch_package_sends_day_offset_and_sniffs_zip() {
            let server = MockServer::start().await;
            let body = archive(&[("20240303_0000_de_qy.xml", "<pack/>")]);
            vendor_request("sendPackage")
                .and(query_param("dayOffset", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/octet-stream"))
                .expect(1)
                .mount(&server)
                .await;

            let temp = TempDir::new().unwrap();
            let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            let outcome = source(&server, temp.path()).fetch_package(2, today).await.unwrap();

            assert_eq!(
                outcome,
                StageOutcome::Staged(vec!["20240303_0000_de_qy.xml".to_string()])
            );
        }

        #[tokio::test]
        async fn test_non_archive_response_is_rejected() {
            let server = MockServer::start().await;
            vendor_request("sendInclude")
                .respond_with(ResponseTemplate::new(200).set_body_raw("<html>invalid pin</html>", "text/html"))
                .mount(&server)
                .await;

            let temp = TempDir::new().unwrap();
            let result = source(&server, temp.path()).fetch_include().await;

            assert!(matches!(
                result,
                Err(AppError::Source(SourceError::UnexpectedContentType { content_type }))
                    if content_type.starts_with("text/html")
            ));
            assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
        }

        #[tokio::test]
        async fn test_http_error_status_is_reported() {
            let server = MockServer::start().await;
            vendor_request("sendPackage")
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let temp = TempDir::new().unwrap();
            let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            let result = source(&server, temp.path()).fetch_package(0, today).await;

            assert!(matches!(
                result,
                Err(AppError::Source(SourceError::Http { status: 503, .. }))
            ));
        }
    }
}
