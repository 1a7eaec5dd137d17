//! PaddleOCR detection backend.
//!
//! Uses paddle-ocr-rs for OCR via ONNX Runtime. Models are not downloaded
//! automatically; point the configured model directory at the det/cls/rec
//! ONNX files from https://github.com/RapidAI/RapidOCR.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use paddle_ocr_rs::ocr_lite::OcrLite;

use super::{Detection, OcrError, TextDetector};

const DET_MODEL_NAME: &str = "ch_PP-OCRv4_det_infer.onnx";
const REC_MODEL_NAME: &str = "ch_PP-OCRv4_rec_infer.onnx";
const CLS_MODEL_NAME: &str = "ch_ppocr_mobile_v2.0_cls_infer.onnx";

/// Global cached OcrLite instance (initialized once, reused for all calls).
/// OcrLite needs &mut self for detection, hence the Mutex.
static OCR_ENGINE: OnceLock<Mutex<OcrLite>> = OnceLock::new();

/// PaddleOCR backend via ONNX Runtime.
pub struct PaddleDetector {
    model_dir: PathBuf,
}

impl PaddleDetector {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    fn model_paths(&self) -> Result<(String, String, String), OcrError> {
        let det = self.model_dir.join(DET_MODEL_NAME);
        let rec = self.model_dir.join(REC_MODEL_NAME);
        let cls = self.model_dir.join(CLS_MODEL_NAME);

        if !det.exists() || !rec.exists() {
            return Err(OcrError::ModelNotFound(format!(
                "expected {} and {} under {}",
                DET_MODEL_NAME,
                REC_MODEL_NAME,
                self.model_dir.display()
            )));
        }

        Ok((
            det.to_string_lossy().to_string(),
            cls.to_string_lossy().to_string(),
            rec.to_string_lossy().to_string(),
        ))
    }

    /// Get or initialize the cached OCR engine.
    fn engine(&self) -> Result<&'static Mutex<OcrLite>, OcrError> {
        if let Some(engine) = OCR_ENGINE.get() {
            return Ok(engine);
        }

        let (det_model, cls_model, rec_model) = self.model_paths()?;

        let mut ocr = OcrLite::new();
        let num_threads = 4;
        ocr.init_models(&det_model, &cls_model, &rec_model, num_threads)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to init PaddleOCR: {}", e)))?;

        // If another thread beat us to it, that's fine
        let _ = OCR_ENGINE.set(Mutex::new(ocr));

        OCR_ENGINE
            .get()
            .ok_or_else(|| OcrError::OcrFailed("Failed to cache OCR engine".to_string()))
    }
}

impl TextDetector for PaddleDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, OcrError> {
        let engine = self.engine()?;
        let mut ocr = engine
            .lock()
            .map_err(|e| OcrError::OcrFailed(format!("Failed to lock OCR engine: {}", e)))?;

        let result = ocr
            .detect_from_path(
                image_path.to_str().unwrap_or(""),
                50,    // padding
                1024,  // max side length
                0.5,   // box score threshold
                0.3,   // unclip ratio
                1.6,   // box threshold
                false, // do angle
                false, // most angle
            )
            .map_err(|e| OcrError::OcrFailed(format!("PaddleOCR detection failed: {}", e)))?;

        Ok(result
            .text_blocks
            .iter()
            .map(|block| Detection {
                polygon: block
                    .box_point
                    .iter()
                    .map(|p| [p.x as f32, p.y as f32])
                    .collect(),
                text: block.text.clone(),
                confidence: block.text_score,
            })
            .collect())
    }

    fn is_available(&self) -> bool {
        self.model_paths().is_ok()
    }

    fn availability_hint(&self) -> String {
        match self.model_paths() {
            Ok(_) => format!("PaddleOCR models found at {}", self.model_dir.display()),
            Err(_) => format!(
                "PaddleOCR models missing from {} (download {} / {} / {} from https://github.com/RapidAI/RapidOCR)",
                self.model_dir.display(),
                DET_MODEL_NAME,
                REC_MODEL_NAME,
                CLS_MODEL_NAME
            ),
        }
    }
}
