//! PDF page rasterization via Poppler.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::ExtractionError;

/// Renders a PDF into one image per page.
pub trait PageRasterizer: Send + Sync {
    /// Render every page of `pdf_path` into `output_dir`, returning the page
    /// images in page order.
    fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Rasterizer shelling out to pdftoppm (poppler-utils).
pub struct PopplerRasterizer {
    /// Render resolution in DPI.
    dpi: u32,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self { dpi: 300 }
    }
}

impl PopplerRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    /// Check whether pdftoppm is on PATH.
    pub fn is_available() -> bool {
        Command::new("pdftoppm").arg("-v").output().is_ok()
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(pdf_path)
            .arg(output_dir.join("page"))
            .status();

        match status {
            Ok(s) if s.success() => {}
            Ok(_) => {
                return Err(ExtractionError::ExtractionFailed(
                    "pdftoppm failed to convert PDF".to_string(),
                ))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::ToolNotFound(
                    "pdftoppm (install poppler-utils)".to_string(),
                ))
            }
            Err(e) => return Err(ExtractionError::Io(e)),
        }

        // pdftoppm names pages page-01.png, page-001.png, ... depending on
        // page count; lexicographic order is page order either way.
        let mut pages: Vec<PathBuf> = std::fs::read_dir(output_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        pages.sort();

        Ok(pages)
    }
}
