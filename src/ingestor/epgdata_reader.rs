//! Quick-XML based reader for epgdata.com package files
//!
//! The vendor files are shallow: a root element holding `<data>` records, each
//! record holding one element per field code. The reader streams through the
//! document and collects every record into a [`RawRecord`] without building a
//! DOM, so the larger daily packages stay cheap to read.

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::models::RawRecord;

const RECORD_ELEMENT: &str = "data";

fn encoding_regex() -> &'static Regex {
    static ENCODING: OnceLock<Regex> = OnceLock::new();
    ENCODING.get_or_init(|| {
        Regex::new(r#"^<\?xml[^>]*encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#)
            .expect("encoding regex should compile")
    })
}

/// Decode raw file bytes into a string, honouring the declared encoding
///
/// The vendor ships ISO-8859-1 packages; those (and cp1252, which is close
/// enough for listing text) are widened byte by byte. Anything else is read as
/// UTF-8, falling back to Latin-1 when the bytes are not valid UTF-8.
pub fn decode_document(bytes: &[u8]) -> String {
    let head_len = bytes.len().min(256);
    let head = String::from_utf8_lossy(&bytes[..head_len]);
    let declared = encoding_regex()
        .captures(head.trim_start_matches('\u{feff}'))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase());

    let is_latin1 = matches!(
        declared.as_deref(),
        Some("iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "windows-1252" | "cp1252")
    );

    if is_latin1 {
        return latin1_to_string(bytes);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(e) => {
            warn!("Document is not valid UTF-8 ({}), reading it as ISO-8859-1", e);
            latin1_to_string(bytes)
        }
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse every `<data>` record of a vendor document
pub fn parse_records(content: &str) -> AppResult<Vec<RawRecord>> {
    let mut reader = Reader::from_str(content);

    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut record_depth = 0usize;
    let mut current: Option<RawRecord> = None;
    let mut field: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                depth += 1;
                let qname = e.name();
                let name = element_name(qname.as_ref())?;

                if current.is_none() {
                    if name == RECORD_ELEMENT {
                        current = Some(RawRecord::new());
                        record_depth = depth;
                    }
                } else if depth == record_depth + 1 {
                    field = Some(name.to_string());
                    text.clear();
                }
            }

            Event::End(ref e) => {
                if current.is_some() {
                    if depth == record_depth + 1 {
                        if let (Some(record), Some(code)) = (current.as_mut(), field.take()) {
                            record.insert(code, std::mem::take(&mut text));
                        }
                    } else if depth == record_depth && element_name(e.name().as_ref())? == RECORD_ELEMENT {
                        records.extend(current.take());
                    }
                }
                depth = depth.saturating_sub(1);
            }

            Event::Empty(ref e) => {
                if depth == record_depth {
                    if let Some(record) = current.as_mut() {
                        // <d20/> is a present but empty field
                        record.insert(element_name(e.name().as_ref())?, "");
                    }
                }
            }

            Event::Text(ref e) => {
                if field.is_some() {
                    text.push_str(utf8(e)?);
                }
            }

            Event::CData(ref e) => {
                if field.is_some() {
                    text.push_str(utf8(e)?);
                }
            }

            Event::GeneralRef(ref e) => {
                if field.is_some() {
                    if let Some(ch) = e.resolve_char_ref()? {
                        text.push(ch);
                    } else {
                        let entity = utf8(e)?;
                        match quick_xml::escape::resolve_predefined_entity(entity) {
                            Some(resolved) => text.push_str(resolved),
                            None => {
                                debug!("Unknown entity &{};, keeping it verbatim", entity);
                                text.push('&');
                                text.push_str(entity);
                                text.push(';');
                            }
                        }
                    }
                }
            }

            Event::Eof => break,

            _ => {} // declarations, comments, doctype
        }
    }

    Ok(records)
}

/// Read and parse one staged file
pub fn read_records(path: &Path) -> AppResult<Vec<RawRecord>> {
    let bytes = std::fs::read(path)?;
    let content = decode_document(&bytes);
    let records = parse_records(&content)?;
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

fn element_name(raw: &[u8]) -> AppResult<&str> {
    std::str::from_utf8(raw)
        .map_err(|e| AppError::internal(format!("Invalid UTF-8 in XML element name: {e}")))
}

fn utf8(bytes: &[u8]) -> AppResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| AppError::internal(format!("Invalid UTF-8 in XML text: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::epgdata::codes;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pack>
  <data>
    <d2>1</d2>
    <d19>Tom &amp; Jerry</d19>
    <d20/>
    <d21><![CDATA[Cat <and> mouse]]></d21>
  </data>
  <data>
    <d2>2</d2>
    <d19>Caf&#233;</d19>
  </data>
</pack>"#;

    #[test]
    fn test_parse_records() {
        let records = parse_records(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.get(codes::PROGRAM_CHANNEL_ID), Some("1"));
        assert_eq!(first.get(codes::TITLE), Some("Tom & Jerry"));
        assert_eq!(first.get(codes::SUBTITLE), Some(""));
        assert_eq!(first.get(codes::COMMENT_LONG), Some("Cat <and> mouse"));

        assert_eq!(records[1].get(codes::TITLE), Some("Café"));
        assert_eq!(records[1].get(codes::SUBTITLE), None);
    }

    #[test]
    fn test_records_found_below_wrapper_elements() {
        let content = r#"<pack><header><d2>ignored</d2></header><block><data><d2>7</d2><d19>A</d19></data></block></pack>"#;

        let records = parse_records(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(codes::PROGRAM_CHANNEL_ID), Some("7"));
        assert_eq!(records[0].get(codes::TITLE), Some("A"));
    }

    #[test]
    fn test_decode_latin1_document() {
        let mut bytes = br#"<?xml version="1.0" encoding="ISO-8859-1"?><pack><data><ch0>"#.to_vec();
        bytes.extend_from_slice(&[b'Z', b'D', b'F', b' ', 0xE4]); // "ZDF ä"
        bytes.extend_from_slice(b"</ch0></data></pack>");

        let content = decode_document(&bytes);
        let records = parse_records(&content).unwrap();
        assert_eq!(records[0].get(codes::CHANNEL_NAME), Some("ZDF ä"));
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_latin1() {
        let bytes = [b'<', b'a', b'>', 0xFC, b'<', b'/', b'a', b'>'];
        assert_eq!(decode_document(&bytes), "<a>ü</a>");
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(parse_records("<pack><data><d2>1</d3></data></pack>").is_err());
    }
}
