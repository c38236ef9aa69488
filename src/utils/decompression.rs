use anyhow::{Context, Result};
use bytes::Bytes;
use std::io::Read;
use zip::read::ZipArchive;

/// Supported payload formats detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Zip,
    Uncompressed,
}

/// One file unpacked from an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Bare file name, directory components stripped
    pub name: String,
    pub contents: Vec<u8>,
}

/// Magic byte detection and archive extraction
pub struct DecompressionService;

impl DecompressionService {
    /// Detect payload format using magic bytes
    pub fn detect_compression_format(data: &[u8]) -> CompressionFormat {
        match infer::get(data).map(|kind| kind.mime_type()) {
            Some("application/zip") => CompressionFormat::Zip,
            _ => CompressionFormat::Uncompressed,
        }
    }

    /// Extract every file of a zip archive
    ///
    /// Directory entries are skipped and entry names are reduced to their file
    /// name so nothing can be written outside the staging directory.
    pub fn extract_zip(data: Bytes) -> Result<Vec<ArchiveEntry>> {
        let cursor = std::io::Cursor::new(data);
        let mut archive = ZipArchive::new(cursor).context("Failed to read zip archive")?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .with_context(|| format!("Failed to get entry {index} from zip archive"))?;

            if file.is_dir() {
                continue;
            }

            let Some(name) = file
                .enclosed_name()
                .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            else {
                anyhow::bail!("Zip entry has an unsafe name: {}", file.name());
            };

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .with_context(|| format!("Failed to read {name} from zip archive"))?;
            entries.push(ArchiveEntry { name, contents });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_detect_uncompressed() {
        let data = b"<?xml version=\"1.0\"?><pack/>";
        let format = DecompressionService::detect_compression_format(data);
        assert_eq!(format, CompressionFormat::Uncompressed);
    }

    #[test]
    fn test_detect_and_extract_zip() {
        let archive = build_zip(&[
            ("20240301_20240301_de_qy.xml", b"<pack/>"),
            ("nested/genre.xml", b"<genres/>"),
        ]);

        assert_eq!(
            DecompressionService::detect_compression_format(&archive),
            CompressionFormat::Zip
        );

        let entries = DecompressionService::extract_zip(Bytes::from(archive)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "20240301_20240301_de_qy.xml");
        assert_eq!(entries[0].contents, b"<pack/>");
        assert_eq!(entries[1].name, "genre.xml");
    }

    #[test]
    fn test_extract_garbage_fails() {
        assert!(DecompressionService::extract_zip(Bytes::from_static(b"not a zip")).is_err());
    }
}
