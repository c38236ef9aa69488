use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};

use crate::config::defaults::{CATEGORY_FILE, GENRE_FILE};
use crate::ingestor::read_records;
use crate::models::RawRecord;
use crate::models::epgdata::codes;

/// Immutable id -> display name table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    /// Build a table from records carrying `key_code` and `value_code`
    ///
    /// Records without a key or without a value are skipped; a repeated key
    /// keeps the last value seen.
    pub fn from_records(records: &[RawRecord], key_code: &str, value_code: &str) -> Self {
        let mut entries = HashMap::new();
        let mut skipped = 0usize;

        for record in records {
            match (record.get(key_code), record.get(value_code)) {
                (Some(key), Some(value)) if !key.is_empty() => {
                    entries.insert(key.to_string(), value.to_string());
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} malformed {} records", skipped, key_code);
        }

        Self { entries }
    }

    /// Load a reference file; an unreadable file yields an empty table
    pub fn load(path: &Path, key_code: &str, value_code: &str) -> Self {
        match read_records(path) {
            Ok(records) => Self::from_records(&records, key_code, value_code),
            Err(e) => {
                error!("Failed to read lookup table {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Category and genre tables of one run
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub categories: LookupTable,
    pub genres: LookupTable,
}

impl LookupTables {
    /// Load `category.xml` and `genre.xml` from the staging directory
    pub fn load(input_dir: &Path) -> Self {
        let categories = LookupTable::load(
            &input_dir.join(CATEGORY_FILE),
            codes::CATEGORY_ID,
            codes::CATEGORY_NAME,
        );
        let genres = LookupTable::load(&input_dir.join(GENRE_FILE), codes::GENRE_ID, codes::GENRE_NAME);

        info!(
            "Loaded {} categories and {} genres",
            categories.len(),
            genres.len()
        );

        Self { categories, genres }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_records_skips_malformed_and_keeps_last() {
        let records = vec![
            RawRecord::new().with("g0", "100").with("g1", "Krimi"),
            RawRecord::new().with("g0", "101"),
            RawRecord::new().with("g1", "Orphan"),
            RawRecord::new().with("g0", "").with("g1", "Empty key"),
            RawRecord::new().with("g0", "100").with("g1", "Thriller"),
        ];

        let table = LookupTable::from_records(&records, "g0", "g1");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("100"), Some("Thriller"));
        assert_eq!(table.get("101"), None);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tables = LookupTables::load(dir.path());
        assert!(tables.categories.is_empty());
        assert!(tables.genres.is_empty());
    }

    #[test]
    fn test_load_reference_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CATEGORY_FILE),
            "<categories><data><ca0>1</ca0><ca1>Spielfilm</ca1></data></categories>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(GENRE_FILE),
            "<genres><data><g0>7</g0><g1>Komödie</g1></data></genres>",
        )
        .unwrap();

        let tables = LookupTables::load(dir.path());
        assert_eq!(tables.categories.get("1"), Some("Spielfilm"));
        assert_eq!(tables.genres.get("7"), Some("Komödie"));
    }
}
