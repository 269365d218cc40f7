use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{Result, RelayError};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a DOCX package, one paragraph per line
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| RelayError::Document(format!("Failed to open DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| RelayError::Document(format!("Missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)?;

    paragraphs(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Text of every `w:p` element, in document order
fn paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| RelayError::Document(format!("Malformed DOCX XML: {}", e)))?;

        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| RelayError::Document(format!("Malformed DOCX text: {}", e)))?;
                current.push_str(&text);
            }
            Event::Empty(e) if e.name().as_ref() == b"w:tab" => current.push('\t'),
            Event::Empty(e) if e.name().as_ref() == b"w:br" => current.push('\n'),
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Empty(e) if e.name().as_ref() == b"w:p" => paragraphs.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Minimal DOCX package holding `body` inside `w:body`
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(DOCUMENT_PART, options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_joined_with_newlines() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Bonjour</w:t></w:r><w:r><w:t xml:space=\"preserve\"> tout le monde</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p>",
        );

        assert_eq!(extract_text(&bytes).unwrap(), "Bonjour tout le monde\n\nFish & chips");
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(extract_text(b"plain text"), Err(RelayError::Document(_))));
    }
}
