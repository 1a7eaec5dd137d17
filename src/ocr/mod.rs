//! OCR detection and text reconstruction.
//!
//! Detection backends implement [`TextDetector`], producing raw
//! [`Detection`] records (bounding polygon + text + confidence, order not
//! guaranteed). [`reconstruct_lines`] turns a set of detections into a
//! reading-order text block.
//!
//! ## Detection backends
//!
//! - **PaddleOCR**: CNN-based OCR via ONNX Runtime (feature: ocr-paddle)
//!
//! Without a compiled-in backend, [`UnavailableDetector`] stands in and
//! reports how to enable one; DOCX extraction never needs a detector.

mod detection;
mod lines;

#[cfg(feature = "ocr-paddle")]
mod paddle;

pub use detection::{Detection, MIN_CONFIDENCE};
pub use lines::{reconstruct_lines, ReconstructError, LINE_TOLERANCE};

#[cfg(feature = "ocr-paddle")]
pub use paddle::PaddleDetector;

use std::path::Path;

use thiserror::Error;

/// Errors from OCR detection backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR model not found: {0}")]
    ModelNotFound(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A text detection backend.
///
/// Implementations read an image from disk and return raw detections. They
/// make no ordering guarantees; callers run the result through
/// [`reconstruct_lines`].
pub trait TextDetector: Send + Sync {
    /// Run detection on an image file.
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, OcrError>;

    /// Whether the backend can run in this environment.
    fn is_available(&self) -> bool;

    /// Human-readable status, including setup instructions when unavailable.
    fn availability_hint(&self) -> String;
}

/// Placeholder detector used when no OCR backend is compiled in.
pub struct UnavailableDetector;

impl TextDetector for UnavailableDetector {
    fn detect(&self, _image_path: &Path) -> Result<Vec<Detection>, OcrError> {
        Err(OcrError::BackendNotAvailable(self.availability_hint()))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn availability_hint(&self) -> String {
        "no OCR backend compiled in (rebuild with --features ocr-paddle)".to_string()
    }
}
