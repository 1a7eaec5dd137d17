//! DOCX paragraph extraction.
//!
//! A DOCX file is a zip container; the document body lives in
//! word/document.xml. Paragraphs (`<w:p>`) hold text runs (`<w:t>`) carrying
//! the visible text in reading order, so no OCR is involved.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::ExtractionError;

/// Reads ordered paragraph strings from a word-processing document.
pub trait ParagraphReader: Send + Sync {
    fn read_paragraphs(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;
}

/// DOCX reader over the zip container.
#[derive(Default)]
pub struct DocxReader;

fn text_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<w:t[^>]*>([^<]*)</w:t>").expect("valid regex"))
}

impl ParagraphReader for DocxReader {
    fn read_paragraphs(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ExtractionError::ExtractionFailed(format!("not a DOCX container: {}", e)))?;

        let mut entry = archive.by_name("word/document.xml").map_err(|e| {
            ExtractionError::ExtractionFailed(format!("missing word/document.xml: {}", e))
        })?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;

        Ok(paragraphs_from_xml(&xml))
    }
}

/// Split the document body into paragraphs and collect each one's text runs.
fn paragraphs_from_xml(xml: &str) -> Vec<String> {
    xml.split("</w:p>")
        .map(|para| {
            let mut text = String::new();
            for cap in text_run_re().captures_iter(para) {
                text.push_str(&cap[1]);
            }
            unescape_xml(&text)
        })
        .collect()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
