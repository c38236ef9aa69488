//! Pruning of staged daily packages
//!
//! Daily files are named `YYYYMMDD_...`. Anything dated before yesterday is no
//! longer useful; reference files without a date prefix are never touched.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{debug, error, info};

/// Outcome of one cleanup pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    pub deleted: Vec<String>,
    pub kept: usize,
    pub failed: Vec<String>,
}

/// Date encoded in a staged file name, if any
pub fn staged_file_date(file_name: &str) -> Option<NaiveDate> {
    let prefix = file_name.split('_').next()?;
    NaiveDate::parse_from_str(prefix, "%Y%m%d").ok()
}

/// Delete staged files dated earlier than `now` minus one day
///
/// A file that cannot be deleted is logged and reported; the pass continues.
pub fn cleanup_staged_files(dir: &Path, now: NaiveDateTime) -> std::io::Result<RetentionReport> {
    let cutoff = now - Duration::days(1);
    let mut report = RetentionReport::default();

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to read entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(file_date) = staged_file_date(&file_name) else {
            debug!("Keeping {}: no date prefix", file_name);
            report.kept += 1;
            continue;
        };

        let stale = file_date
            .and_hms_opt(0, 0, 0)
            .is_some_and(|midnight| midnight < cutoff);

        if !stale {
            report.kept += 1;
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                info!("{} deleted.", file_name);
                report.deleted.push(file_name);
            }
            Err(e) => {
                error!("{} failed to delete: {}", file_name, e);
                report.failed.push(file_name);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_staged_file_date() {
        assert_eq!(
            staged_file_date("20240301_20240301_de_qy.xml"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(staged_file_date("genre.xml"), None);
        assert_eq!(staged_file_date("channel_y.xml"), None);
    }

    #[test]
    fn test_cleanup_removes_only_stale_dated_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "20240228_20240228_de_qy.xml",
            "20240229_20240229_de_qy.xml",
            "20240301_20240301_de_qy.xml",
            "20240302_20240302_de_qy.xml",
            "genre.xml",
        ] {
            std::fs::write(dir.path().join(name), "<pack/>").unwrap();
        }

        let report = cleanup_staged_files(dir.path(), at("2024-03-01 10:00:00")).unwrap();

        let mut deleted = report.deleted.clone();
        deleted.sort();
        assert_eq!(
            deleted,
            vec!["20240228_20240228_de_qy.xml", "20240229_20240229_de_qy.xml"]
        );
        assert_eq!(report.kept, 3);
        assert!(report.failed.is_empty());
        assert!(dir.path().join("20240301_20240301_de_qy.xml").exists());
        assert!(dir.path().join("genre.xml").exists());
    }
}
