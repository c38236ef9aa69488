//! Conversion service
//!
//! Drives one run end to end: prune stale packages, stage fresh ones, build the
//! lookup tables, map channels, map every daily file and write the document.
//! Everything runs sequentially; a failing file or record is logged and skipped.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::config::defaults::{CATEGORY_FILE, CHANNEL_FILE, GENRE_FILE};
use crate::data_mapping::{ChannelAllowList, ChannelMapper, LookupTables, ProgrammeMapper};
use crate::errors::{AppError, AppResult};
use crate::generator::{ChannelStage, GeneratorInfo, XmltvDocument, write_document};
use crate::ingestor::read_records;
use crate::metadata::{EpisodeResolver, ResolverStats};
use crate::models::{ChannelRecord, ProgramRecord};
use crate::sources::{EpgDataSource, StageOutcome};
use crate::utils::{UtcOffset, cleanup_staged_files};

const REFERENCE_FILES: [&str; 3] = [CATEGORY_FILE, GENRE_FILE, CHANNEL_FILE];

/// Per-run switches that do not belong in the config file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Fetch a single day offset instead of the configured range
    pub day: Option<u32>,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub channels_kept: usize,
    pub channels_dropped: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub programmes_emitted: usize,
    /// Programmes on channels that were not emitted
    pub programmes_dropped: usize,
    pub programmes_duplicate: usize,
    /// Records with malformed timestamps or numbers
    pub programmes_failed: usize,
    pub episodes: ResolverStats,
}

impl ConversionStats {
    pub fn log_summary(&self) {
        info!(
            "Channels: {} kept, {} dropped",
            self.channels_kept, self.channels_dropped
        );
        info!(
            "Files: {} processed, {} failed",
            self.files_processed, self.files_failed
        );
        info!(
            "Programmes: {} emitted, {} dropped, {} duplicate, {} failed",
            self.programmes_emitted,
            self.programmes_dropped,
            self.programmes_duplicate,
            self.programmes_failed
        );
        if self.episodes.lookups > 0 {
            info!(
                "Episodes: {} of {} lookups resolved ({} cached)",
                self.episodes.resolved, self.episodes.lookups, self.episodes.cache_hits
            );
        }
    }
}

/// Daily program files in `dir`, sorted by name, reference files excluded
pub fn list_program_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_xml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));

        if is_xml && !REFERENCE_FILES.contains(&name) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub struct ConversionService {
    config: Config,
    resolver: Option<EpisodeResolver>,
    offset: UtcOffset,
}

impl ConversionService {
    pub fn new(config: Config, resolver: Option<EpisodeResolver>) -> AppResult<Self> {
        let offset = UtcOffset::detect(config.output.timezone.as_deref()).map_err(AppError::configuration)?;
        info!("Using UTC offset {}", offset);

        Ok(Self {
            config,
            resolver,
            offset,
        })
    }

    /// Run cleanup, staging, conversion and output for the moment `now`
    pub async fn run(&self, options: &RunOptions, now: NaiveDateTime) -> AppResult<ConversionStats> {
        if self.config.storage.retention_enabled {
            self.cleanup(now);
        }

        if self.config.epgdata.fetch_enabled {
            self.stage(options, now).await;
        } else {
            info!("Fetching disabled, converting already staged files");
        }

        let (document, stats) = self.convert_staged_files().await?;
        write_document(&document, &self.config.output_file_path())?;
        stats.log_summary();

        Ok(stats)
    }

    fn cleanup(&self, now: NaiveDateTime) {
        let input = &self.config.storage.input_path;
        match cleanup_staged_files(input, now) {
            Ok(report) => info!(
                "Retention: {} deleted, {} kept, {} failed",
                report.deleted.len(),
                report.kept,
                report.failed.len()
            ),
            Err(e) => error!("Failed to clean {}: {}", input.display(), e),
        }
    }

    /// Fetch reference files and daily packages; failures leave staged files as they are
    async fn stage(&self, options: &RunOptions, now: NaiveDateTime) {
        let source = match EpgDataSource::new(&self.config.epgdata, &self.config.storage.input_path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping fetch: {}", e);
                return;
            }
        };

        if let Err(e) = source.fetch_include().await {
            error!("Failed to fetch reference files: {}", e);
        }

        let today = now.date();
        for day_offset in self.day_offsets(options) {
            match source.fetch_package(day_offset, today).await {
                Ok(StageOutcome::Staged(files)) => info!("Day {}: staged {} files", day_offset, files.len()),
                Ok(StageOutcome::AlreadyStaged) => {}
                Err(e) => error!("Failed to fetch package for day {}: {}", day_offset, e),
            }
        }
    }

    fn day_offsets(&self, options: &RunOptions) -> Vec<u32> {
        match options.day {
            Some(day) => vec![day],
            None => (0..self.config.epgdata.days).collect(),
        }
    }

    /// Convert whatever is staged in the input directory
    pub async fn convert_staged_files(&self) -> AppResult<(XmltvDocument, ConversionStats)> {
        let input = &self.config.storage.input_path;
        let output = &self.config.output;
        let mut stats = ConversionStats::default();

        let lookups = LookupTables::load(input);
        let allow_list = ChannelAllowList::load(&self.config.storage.channel_filter_path).map_err(|e| {
            AppError::configuration(format!(
                "Failed to read channel filter {}: {}",
                self.config.storage.channel_filter_path.display(),
                e
            ))
        })?;
        info!("Loaded {} allowed channel names", allow_list.len());

        let mut channels = ChannelStage::new(GeneratorInfo::new(
            output.generator_info_name.as_str(),
            output.generator_info_url.as_str(),
        ));
        let channel_mapper = ChannelMapper::new(&allow_list, &output.language);

        let channel_path = input.join(CHANNEL_FILE);
        match read_records(&channel_path) {
            Ok(records) => {
                for record in records.iter().map(ChannelRecord::from) {
                    let kept = channel_mapper
                        .map_channel(&record)
                        .is_some_and(|channel| channels.push_channel(channel));
                    if kept {
                        stats.channels_kept += 1;
                    } else {
                        stats.channels_dropped += 1;
                    }
                }
            }
            Err(e) => error!("Failed to read {}: {}", channel_path.display(), e),
        }
        info!("Mapped {} channels", channels.channel_count());

        let mut programmes = channels.into_programmes(output.deduplicate_programmes);
        let known_channels = programmes.known_channels();
        let mut mapper = ProgrammeMapper::new(&lookups, &known_channels, self.offset, &output.language);
        if let Some(resolver) = &self.resolver {
            mapper = mapper.with_resolver(resolver);
        }

        let program_files = list_program_files(input).unwrap_or_else(|e| {
            error!("Failed to list program files in {}: {}", input.display(), e);
            Vec::new()
        });

        for path in program_files {
            let records = match read_records(&path) {
                Ok(records) => records,
                Err(e) => {
                    error!("Failed to read {}: {}", path.display(), e);
                    stats.files_failed += 1;
                    continue;
                }
            };
            stats.files_processed += 1;

            for record in records.iter().map(ProgramRecord::from) {
                match mapper.map_program(&record).await {
                    Ok(Some(programme)) => {
                        if programmes.push_programme(programme) {
                            stats.programmes_emitted += 1;
                        } else {
                            stats.programmes_duplicate += 1;
                        }
                    }
                    Ok(None) => stats.programmes_dropped += 1,
                    Err(e) => {
                        warn!(
                            "Dropping programme '{}' on channel {} from {}: {}",
                            record.title,
                            record.channel_id,
                            path.display(),
                            e
                        );
                        stats.programmes_failed += 1;
                    }
                }
            }

            info!("Processed {}", path.display());
        }

        if let Some(resolver) = &self.resolver {
            stats.episodes = resolver.stats();
        }

        Ok((programmes.finish(), stats))
    }
}
