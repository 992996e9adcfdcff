//! PDF page counting and rasterization.

mod rasterizer;

pub use rasterizer::PopplerRasterizer;

use std::path::Path;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Inclusive, 1-indexed page range. An open end runs to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: u32,
    pub last: Option<u32>,
}

impl PageRange {
    /// Pages `first..=last`.
    pub fn between(first: u32, last: u32) -> Self {
        Self {
            first,
            last: Some(last),
        }
    }

    /// Pages `first..` to the end of the document.
    pub fn starting_at(first: u32) -> Self {
        Self { first, last: None }
    }

    /// Resolve against a document's page count.
    ///
    /// Fails when the document does not reach the range's last required page.
    pub fn resolve(&self, page_count: u32) -> Result<(u32, u32)> {
        if self.first == 0 {
            return Err(PdfError::InvalidPage(0));
        }
        let required = self.last.unwrap_or(self.first).max(self.first);
        if page_count < required {
            return Err(PdfError::InsufficientPages {
                required,
                found: page_count,
            });
        }
        Ok((self.first, self.last.unwrap_or(page_count)))
    }
}

/// Renders PDF pages to raster images.
pub trait PageRasterizer {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Render the pages in `range` at `dpi`, in page order.
    fn rasterize(&self, path: &Path, range: PageRange, dpi: u32) -> Result<Vec<DynamicImage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_range_resolves_to_last_page() {
        assert_eq!(PageRange::starting_at(6).resolve(7).unwrap(), (6, 7));
        assert_eq!(PageRange::starting_at(6).resolve(6).unwrap(), (6, 6));
    }

    #[test]
    fn test_short_document_is_insufficient() {
        let err = PageRange::starting_at(6).resolve(5).unwrap_err();
        assert!(matches!(
            err,
            PdfError::InsufficientPages {
                required: 6,
                found: 5
            }
        ));

        let err = PageRange::between(1, 2).resolve(1).unwrap_err();
        assert!(matches!(
            err,
            PdfError::InsufficientPages {
                required: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_page_zero_is_invalid() {
        assert!(matches!(
            PageRange::between(0, 2).resolve(3),
            Err(PdfError::InvalidPage(0))
        ));
    }
}
