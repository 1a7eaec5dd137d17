//! Raw OCR detection records.

use serde::{Deserialize, Serialize};

/// Minimum recognition confidence for a detection to be kept.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// One recognized text fragment with its bounding polygon and confidence.
///
/// Detectors report a quadrilateral per fragment; the first point is the
/// top-left corner for roughly axis-aligned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding polygon in detector order. A well-formed detection has 4 points.
    pub polygon: Vec<[f32; 2]>,
    /// Recognized text.
    pub text: String,
    /// Recognition confidence in [0, 1].
    pub confidence: f32,
}

impl Detection {
    pub fn new(polygon: Vec<[f32; 2]>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }

    /// Mean y coordinate of the polygon points.
    pub fn centroid_y(&self) -> f32 {
        let sum: f32 = self.polygon.iter().map(|p| p[1]).sum();
        sum / self.polygon.len() as f32
    }

    /// First polygon point as reported by the detector.
    pub fn top_left(&self) -> [f32; 2] {
        self.polygon.first().copied().unwrap_or([0.0, 0.0])
    }

    /// Whether this detection survives filtering: a full quadrilateral,
    /// non-blank text, and confidence at or above [`MIN_CONFIDENCE`].
    /// Malformed detections are skipped, never an error.
    pub fn is_usable(&self) -> bool {
        self.polygon.len() >= 4
            && !self.text.trim().is_empty()
            && self.confidence >= MIN_CONFIDENCE
    }
}
