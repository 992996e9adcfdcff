//! Page rasterization through poppler's `pdftoppm`, page counting through lopdf.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use lopdf::Document;
use tracing::{debug, trace};

use super::{PageRange, PageRasterizer, Result};
use crate::error::PdfError;
use crate::models::config::RasterConfig;

/// Rasterizer that shells out to `pdftoppm`.
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl PopplerRasterizer {
    /// Create a rasterizer using `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
        }
    }

    /// Create a rasterizer from configuration.
    pub fn from_config(config: &RasterConfig) -> Self {
        Self {
            program: config.pdftoppm_path.clone(),
        }
    }

    fn load_document(path: &Path) -> Result<Document> {
        let data = std::fs::read(path).map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        let mut doc = Document::load_mem(&data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Scanned filings are sometimes saved with an empty owner password.
        if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|e| PdfError::Parse(format!("encrypted PDF: {}", e)))?;
            debug!("Decrypted {} with empty password", path.display());
        }

        Ok(doc)
    }

    /// Page number `pdftoppm` encoded in an output file name (`page-06.png`).
    fn page_number(path: &Path) -> Option<u32> {
        let stem = path.file_stem()?.to_str()?;
        stem.rsplit('-').next()?.parse().ok()
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn page_count(&self, path: &Path) -> Result<u32> {
        let doc = Self::load_document(path)?;
        let count = doc.get_pages().len() as u32;
        if count == 0 {
            return Err(PdfError::NoPages);
        }
        debug!("{} has {} pages", path.display(), count);
        Ok(count)
    }

    fn rasterize(&self, path: &Path, range: PageRange, dpi: u32) -> Result<Vec<DynamicImage>> {
        let (first, last) = range.resolve(self.page_count(path)?)?;

        let temp_dir = tempfile::tempdir()
            .map_err(|e| PdfError::Render(format!("failed to create temp dir: {}", e)))?;
        let prefix = temp_dir.path().join("page");

        let output = Command::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(first.to_string())
            .arg("-l")
            .arg(last.to_string())
            .arg("-png")
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                PdfError::Render(format!(
                    "failed to execute {} (install poppler-utils): {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(PdfError::Render(format!(
                "{} failed: {}",
                self.program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(temp_dir.path())
            .map_err(|e| PdfError::Render(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
            .filter_map(|p| Self::page_number(&p).map(|n| (n, p)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        let mut images = Vec::with_capacity(pages.len());
        for (number, page_path) in pages {
            trace!("Loading rendered page {} from {}", number, page_path.display());
            let image = image::open(&page_path)
                .map_err(|e| PdfError::Render(format!("page {}: {}", number, e)))?;
            images.push(image);
        }

        if images.is_empty() {
            return Err(PdfError::Render(format!(
                "no pages rendered for range {}-{}",
                first, last
            )));
        }

        debug!(
            "Rendered {} pages of {} at {} DPI",
            images.len(),
            path.display(),
            dpi
        );
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_from_output_name() {
        assert_eq!(
            PopplerRasterizer::page_number(Path::new("/tmp/x/page-06.png")),
            Some(6)
        );
        assert_eq!(
            PopplerRasterizer::page_number(Path::new("/tmp/x/page-12.png")),
            Some(12)
        );
        assert_eq!(PopplerRasterizer::page_number(Path::new("/tmp/x/page.png")), None);
    }

    #[test]
    fn test_unreadable_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let result = PopplerRasterizer::new().page_count(&path);
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }
}
