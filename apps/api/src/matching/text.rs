//! Uploaded document to plain text.
//!
//! Extraction never fails: any decoding problem degrades to an empty string
//! so a bad upload cannot abort the matching pipeline.

use std::io::{Cursor, Read};
use std::panic;

use quick_xml::{events::Event, Reader as XmlReader};
use tracing::warn;
use zip::ZipArchive;

/// Document format, inferred from the upload's filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if lower.ends_with(".docx") {
            DocumentKind::Docx
        } else {
            DocumentKind::PlainText
        }
    }
}

/// Extracts plain text from `bytes`, using `filename` as the format hint.
pub fn extract_text(bytes: &[u8], filename: &str) -> String {
    match DocumentKind::from_filename(filename) {
        DocumentKind::Pdf => extract_pdf_text(bytes),
        DocumentKind::Docx => extract_docx_text(bytes).unwrap_or_else(|e| {
            warn!("DOCX extraction degraded to empty text for '{filename}': {e}");
            String::new()
        }),
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Page-wise extraction, pages concatenated in order; a page without text adds nothing.
/// The decoder can panic on hostile input, so it runs behind `catch_unwind`.
fn extract_pdf_text(bytes: &[u8]) -> String {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => pages.concat(),
        Ok(Err(e)) => {
            warn!("PDF extraction degraded to empty text: {e}");
            String::new()
        }
        Err(_) => {
            warn!("PDF decoder panicked; degraded to empty text");
            String::new()
        }
    }
}

/// Reads `word/document.xml` out of the DOCX container; one line per paragraph.
fn extract_docx_text(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")?
        .read_to_string(&mut xml)?;

    let mut reader = XmlReader::from_str(&xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"w:t" => in_text_node = true,
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(e) => {
                if in_text_node {
                    current.push_str(&e.unescape()?);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"w:t" => in_text_node = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}
