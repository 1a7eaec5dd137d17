//! Reading-order line reconstruction from raw OCR detections.
//!
//! Detectors return text fragments in no guaranteed order. This module sorts
//! them top-to-bottom then left-to-right and groups them into lines with a
//! fixed vertical tolerance. The grouping is a greedy single pass keyed on
//! the first fragment of each line; it accepts minor errors near line
//! boundaries in exchange for predictable behavior on skewed scans.

use thiserror::Error;

use super::detection::Detection;

/// Maximum vertical distance between a fragment's centroid and the line
/// anchor for the fragment to join the line, in detector coordinates.
pub const LINE_TOLERANCE: f32 = 10.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("no text found")]
    NoTextFound,
}

/// Order detections into reading-order lines and join them into a text block.
///
/// Fragments below the confidence floor, with blank text, or with truncated
/// polygons are dropped up front. Lines are joined with `\n`, fragments
/// within a line with a single space.
pub fn reconstruct_lines(detections: &[Detection]) -> Result<String, ReconstructError> {
    let mut usable: Vec<&Detection> = detections.iter().filter(|d| d.is_usable()).collect();
    if usable.is_empty() {
        return Err(ReconstructError::NoTextFound);
    }

    // Stable sort: fragments with identical corners keep detector order.
    usable.sort_by(|a, b| {
        let (pa, pb) = (a.top_left(), b.top_left());
        pa[1].total_cmp(&pb[1]).then(pa[0].total_cmp(&pb[0]))
    });

    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    // Anchor is the centroid of the line's first fragment and does not drift
    // as fragments join the line.
    let mut anchor_y: Option<f32> = None;

    for det in usable {
        let y = det.centroid_y();
        match anchor_y {
            None => anchor_y = Some(y),
            Some(anchor) if (y - anchor).abs() > LINE_TOLERANCE => {
                lines.push(current.join(" "));
                current.clear();
                anchor_y = Some(y);
            }
            Some(_) => {}
        }
        current.push(det.text.trim());
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    let text = lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() {
        return Err(ReconstructError::NoTextFound);
    }
    Ok(text)
}
