//! Text extraction from documents.
//!
//! Dispatches on MIME type: PDFs are rasterized page by page and run through
//! OCR, DOCX paragraphs are read straight out of the container, images are
//! OCRed directly. Extraction is never retried — a bad scan stays bad — and
//! file lifecycle stays with the caller.

mod docx;
mod pdf;

pub use docx::{DocxReader, ParagraphReader};
pub use pdf::{PageRasterizer, PopplerRasterizer};

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ocr::{reconstruct_lines, OcrError, ReconstructError, TextDetector};

/// MIME type of DOCX files.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("No text found in document")]
    NoTextFound,

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReconstructError> for ExtractionError {
    fn from(_: ReconstructError) -> Self {
        ExtractionError::NoTextFound
    }
}

/// Text extractor over a detection backend and format collaborators.
pub struct TextExtractor {
    detector: Arc<dyn TextDetector>,
    rasterizer: Arc<dyn PageRasterizer>,
    docx_reader: Arc<dyn ParagraphReader>,
}

impl TextExtractor {
    /// Create an extractor with the given detection backend and the default
    /// collaborators (pdftoppm rasterizer, zip DOCX reader).
    pub fn new(detector: Arc<dyn TextDetector>) -> Self {
        Self {
            detector,
            rasterizer: Arc::new(PopplerRasterizer::default()),
            docx_reader: Arc::new(DocxReader),
        }
    }

    /// Replace the PDF rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Replace the DOCX paragraph reader.
    pub fn with_docx_reader(mut self, docx_reader: Arc<dyn ParagraphReader>) -> Self {
        self.docx_reader = docx_reader;
        self
    }

    /// Extract text from a file based on its MIME type.
    pub fn extract(&self, file_path: &Path, mime_type: &str) -> Result<String, ExtractionError> {
        match mime_type {
            "application/pdf" => self.extract_pdf(file_path),
            DOCX_MIME => self.extract_docx(file_path),
            "image/png" | "image/jpeg" | "image/tiff" | "image/gif" | "image/bmp" => {
                self.extract_image(file_path)
            }
            _ => Err(ExtractionError::UnsupportedFileType(mime_type.to_string())),
        }
    }

    /// Rasterize each PDF page, OCR it, and concatenate page texts with
    /// `=== Page N ===` headers. Pages without readable text are dropped;
    /// if none are readable the whole document fails.
    fn extract_pdf(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let pages = self.rasterizer.rasterize(file_path, temp_dir.path())?;
        if pages.is_empty() {
            return Err(ExtractionError::ExtractionFailed(
                "no pages rasterized from PDF".to_string(),
            ));
        }

        let mut out = String::new();
        for (i, page) in pages.iter().enumerate() {
            let page_num = i + 1;

            let detections = match self.detector.detect(page) {
                Ok(detections) => detections,
                Err(e @ OcrError::BackendNotAvailable(_)) | Err(e @ OcrError::ModelNotFound(_)) => {
                    return Err(e.into());
                }
                Err(e) => {
                    warn!("OCR failed for page {}: {}", page_num, e);
                    continue;
                }
            };

            match reconstruct_lines(&detections) {
                Ok(text) => {
                    debug!("page {}: {} chars", page_num, text.len());
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(&format!("=== Page {} ===\n", page_num));
                    out.push_str(&text);
                    out.push('\n');
                }
                Err(ReconstructError::NoTextFound) => {
                    debug!("page {}: no text", page_num);
                }
            }
        }

        if out.trim().is_empty() {
            return Err(ExtractionError::ExtractionFailed(
                "no text in any page".to_string(),
            ));
        }
        Ok(out)
    }

    /// Join already-ordered DOCX paragraphs with newlines.
    fn extract_docx(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let paragraphs = self.docx_reader.read_paragraphs(file_path)?;
        let text = paragraphs.join("\n");
        if text.trim().is_empty() {
            return Err(ExtractionError::ExtractionFailed(
                "empty document".to_string(),
            ));
        }
        Ok(text)
    }

    fn extract_image(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let detections = self.detector.detect(file_path)?;
        Ok(reconstruct_lines(&detections)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Detection;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Detector scripted per page file name.
    struct FakeDetector {
        pages: HashMap<String, Vec<Detection>>,
    }

    impl FakeDetector {
        fn new(pages: Vec<(&str, Vec<Detection>)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(name, dets)| (name.to_string(), dets))
                    .collect(),
            }
        }
    }

    impl TextDetector for FakeDetector {
        fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, OcrError> {
            let name = image_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            Ok(self.pages.get(name).cloned().unwrap_or_default())
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            "fake".to_string()
        }
    }

    struct FakeRasterizer {
        pages: Vec<&'static str>,
    }

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, _pdf: &Path, _dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
            Ok(self.pages.iter().map(PathBuf::from).collect())
        }
    }

    struct FakeParagraphs {
        paragraphs: Vec<&'static str>,
    }

    impl ParagraphReader for FakeParagraphs {
        fn read_paragraphs(&self, _path: &Path) -> Result<Vec<String>, ExtractionError> {
            Ok(self.paragraphs.iter().map(|p| p.to_string()).collect())
        }
    }

    fn det(text: &str, x: f32, y: f32) -> Detection {
        Detection::new(
            vec![[x, y], [x + 40.0, y], [x + 40.0, y + 10.0], [x, y + 10.0]],
            text,
            0.9,
        )
    }

    fn extractor_with(
        detector: FakeDetector,
        rasterizer: FakeRasterizer,
    ) -> TextExtractor {
        TextExtractor::new(Arc::new(detector)).with_rasterizer(Arc::new(rasterizer))
    }

    #[test]
    fn test_pdf_skips_unreadable_pages() {
        // Page 1 has nothing readable; only page 2 gets a header.
        let detector = FakeDetector::new(vec![
            ("page-1.png", vec![]),
            ("page-2.png", vec![det("hello", 0.0, 0.0)]),
        ]);
        let rasterizer = FakeRasterizer {
            pages: vec!["page-1.png", "page-2.png"],
        };

        let text = extractor_with(detector, rasterizer)
            .extract(Path::new("doc.pdf"), "application/pdf")
            .unwrap();

        assert_eq!(text.matches("=== Page 2 ===").count(), 1);
        assert!(!text.contains("=== Page 1 ==="));
        assert!(text.contains("hello"));
    }

    #[test]
    fn test_pdf_with_no_readable_pages_fails() {
        let detector = FakeDetector::new(vec![("page-1.png", vec![]), ("page-2.png", vec![])]);
        let rasterizer = FakeRasterizer {
            pages: vec!["page-1.png", "page-2.png"],
        };

        let err = extractor_with(detector, rasterizer)
            .extract(Path::new("doc.pdf"), "application/pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(reason) if reason == "no text in any page"));
    }

    #[test]
    fn test_pdf_pages_keep_order() {
        let detector = FakeDetector::new(vec![
            ("page-1.png", vec![det("one", 0.0, 0.0)]),
            ("page-2.png", vec![det("two", 0.0, 0.0)]),
        ]);
        let rasterizer = FakeRasterizer {
            pages: vec!["page-1.png", "page-2.png"],
        };

        let text = extractor_with(detector, rasterizer)
            .extract(Path::new("doc.pdf"), "application/pdf")
            .unwrap();

        let first = text.find("=== Page 1 ===").unwrap();
        let second = text.find("=== Page 2 ===").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_docx_joins_paragraphs() {
        let extractor = TextExtractor::new(Arc::new(FakeDetector::new(vec![])))
            .with_docx_reader(Arc::new(FakeParagraphs {
                paragraphs: vec!["first", "second"],
            }));

        let text = extractor.extract(Path::new("doc.docx"), DOCX_MIME).unwrap();
        assert_eq!(text, "first\nsecond");
    }

    #[test]
    fn test_blank_docx_is_empty_document() {
        let extractor = TextExtractor::new(Arc::new(FakeDetector::new(vec![])))
            .with_docx_reader(Arc::new(FakeParagraphs {
                paragraphs: vec!["", "   "],
            }));

        let err = extractor
            .extract(Path::new("doc.docx"), DOCX_MIME)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(reason) if reason == "empty document"));
    }

    #[test]
    fn test_image_no_text_propagates() {
        let extractor = TextExtractor::new(Arc::new(FakeDetector::new(vec![])));
        let err = extractor
            .extract(Path::new("scan.png"), "image/png")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoTextFound));
    }

    #[test]
    fn test_image_extraction() {
        let detector = FakeDetector::new(vec![(
            "scan.png",
            vec![det("B", 50.0, 0.0), det("A", 0.0, 0.0)],
        )]);
        let extractor = TextExtractor::new(Arc::new(detector));
        let text = extractor.extract(Path::new("scan.png"), "image/png").unwrap();
        assert_eq!(text, "A B");
    }

    #[test]
    fn test_unsupported_mime_type() {
        let extractor = TextExtractor::new(Arc::new(FakeDetector::new(vec![])));
        let err = extractor
            .extract(Path::new("notes.txt"), "text/plain")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType(_)));
    }
}
