//! XMLTV serialization
//!
//! The element tree is written through `quick_xml::Writer`, which takes care of
//! escaping attribute values and text. Text-only elements stay on one line.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::XmltvDocument;
use crate::errors::AppResult;
use crate::models::XmlElement;

const INDENT_SIZE: usize = 2;

/// Render a document to UTF-8 bytes, declaration included
pub fn render_document(document: &XmltvDocument) -> AppResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))?;
    write_element(&mut writer, &document.root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write the document to `path`, creating parent directories as needed
///
/// Returns the number of bytes written.
pub fn write_document(document: &XmltvDocument, path: &Path) -> AppResult<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = render_document(document)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(&bytes)?;
    file.flush()?;

    info!("Wrote {} bytes of XMLTV to {}", bytes.len(), path.display());
    Ok(bytes.len() as u64)
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &XmlElement) -> AppResult<()> {
    let start = BytesStart::new(element.name.as_str()).with_attributes(
        element
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );

    if element.text.is_none() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = element.text() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ChannelStage, GeneratorInfo};
    use tempfile::TempDir;

    fn sample_document() -> XmltvDocument {
        let mut channels = ChannelStage::new(GeneratorInfo::new("EPGData2XMLTV", "http://example.com"));
        channels.push_channel(
            XmlElement::new("channel")
                .with_attr("id", "1")
                .with_child(XmlElement::text_element("display-name", "Das Erste").with_attr("lang", "de")),
        );

        let mut programmes = channels.into_programmes(true);
        programmes.push_programme(
            XmlElement::new("programme")
                .with_attr("channel", "1")
                .with_attr("start", "20240301201500 +0100")
                .with_child(XmlElement::text_element("title", "Tom & Jerry <Spezial>").with_attr("lang", "de"))
                .with_child(XmlElement::new("icon").with_attr("src", "http://img/a.jpg?x=1&y=2")),
        );
        programmes.finish()
    }

    fn render(document: &XmltvDocument) -> String {
        String::from_utf8(render_document(document).unwrap()).unwrap()
    }

    #[test]
    fn test_declaration_and_root() {
        let xml = render(&sample_document());
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>"#));
        assert!(xml.contains(r#"<tv generator-info-name="EPGData2XMLTV" generator-info-url="http://example.com">"#));
        assert!(xml.trim_end().ends_with("</tv>"));
    }

    #[test]
    fn test_escaping_and_indentation() {
        let xml = render(&sample_document());
        assert!(xml.contains("\n  <channel id=\"1\">"));
        assert!(xml.contains("\n    <display-name lang=\"de\">Das Erste</display-name>"));
        assert!(xml.contains("<title lang=\"de\">Tom &amp; Jerry &lt;Spezial&gt;</title>"));
        assert!(xml.contains("<icon src=\"http://img/a.jpg?x=1&amp;y=2\"/>"));
    }

    #[test]
    fn test_rendered_output_parses_back() {
        let xml = render(&sample_document());
        let mut reader = quick_xml::Reader::from_str(&xml);
        let mut elements = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(_) | Event::Empty(_) => elements += 1,
                Event::Eof => break,
                _ => {}
            }
        }
        // tv, channel, display-name, programme, title, icon
        assert_eq!(elements, 6);
    }

    #[test]
    fn test_write_document_creates_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("epg.xml");

        let written = write_document(&sample_document(), &path).unwrap();
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(written, on_disk.len() as u64);
    }
}
