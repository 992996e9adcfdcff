//! Per-case extraction pipelines.
//!
//! Each pipeline is a small state machine. Every transition either enters the
//! next [`Stage`] or stops with a [`CaseFailure`] naming the stage it could not
//! enter.

mod address;
mod demand;
mod stage;

pub use stage::{CaseFailure, Stage};

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Result, ScrapeError};
use crate::layout::{BoxDetector, BoxLocator, CroppedField};
use crate::models::case::{CaseId, ExtractedAddress, ExtractedDemand};
use crate::models::config::{RasterConfig, RecognitionConfig, ScrapeConfig, TemplateProfile};
use crate::ocr::TextRecognizer;
use crate::pdf::PageRasterizer;

/// Extracts fields for one case at a time.
pub trait CaseExtractor {
    /// Mailing address from the civil case cover sheet.
    fn extract_address(&self, case: &CaseId) -> std::result::Result<ExtractedAddress, CaseFailure>;

    /// Initial demand from the complaint.
    fn extract_demand(&self, case: &CaseId) -> std::result::Result<ExtractedDemand, CaseFailure>;
}

/// Pipeline over a directory of scanned case documents.
pub struct CasePipeline<R, D, T> {
    docs_dir: PathBuf,
    template: TemplateProfile,
    raster: RasterConfig,
    recognition: RecognitionConfig,
    rasterizer: R,
    locator: BoxLocator<D>,
    recognizer: T,
    crop_dump_dir: Option<PathBuf>,
}

impl<R, D, T> CasePipeline<R, D, T>
where
    R: PageRasterizer,
    D: BoxDetector,
    T: TextRecognizer,
{
    /// Build a pipeline for the config's active template.
    pub fn new(
        docs_dir: impl Into<PathBuf>,
        config: &ScrapeConfig,
        rasterizer: R,
        detector: D,
        recognizer: T,
    ) -> Result<Self> {
        let template = config.template()?.clone();
        let locator = BoxLocator::new(detector, template.cover_sheet.rotation);
        Ok(Self {
            docs_dir: docs_dir.into(),
            template,
            raster: config.raster.clone(),
            recognition: config.ocr.clone(),
            rasterizer,
            locator,
            recognizer,
            crop_dump_dir: None,
        })
    }

    /// Save every field crop as `<case>_<field>.png` under `dir`.
    pub fn with_crop_dump(mut self, dir: impl Into<PathBuf>) -> Self {
        self.crop_dump_dir = Some(dir.into());
        self
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Crop dumps are for inspection only; a failed write is logged and the
    /// case carries on.
    fn dump_crop(&self, case: &CaseId, crop: &CroppedField) {
        let Some(dir) = &self.crop_dump_dir else {
            return;
        };
        let name = format!("{}_{}.png", case.key(), crop.field).replace([' ', '/', '\\'], "_");
        let path = dir.join(name);
        let saved = std::fs::create_dir_all(dir)
            .map_err(ScrapeError::from)
            .and_then(|()| crop.image.save(&path).map_err(ScrapeError::from));
        if let Err(error) = saved {
            warn!("Could not save {} crop to {}: {}", crop.field, path.display(), error);
        }
    }
}

impl<R, D, T> CaseExtractor for CasePipeline<R, D, T>
where
    R: PageRasterizer,
    D: BoxDetector,
    T: TextRecognizer,
{
    fn extract_address(&self, case: &CaseId) -> std::result::Result<ExtractedAddress, CaseFailure> {
        address::run(self, case)
    }

    fn extract_demand(&self, case: &CaseId) -> std::result::Result<ExtractedDemand, CaseFailure> {
        demand::run(self, case)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Test doubles for the pipeline's collaborators.

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::Path;

    use image::{DynamicImage, GrayImage, Luma};

    use crate::error::{OcrError, PdfError};
    use crate::layout::BoxDetector;
    use crate::models::case::BoundingBox;
    use crate::models::config::{DetectionProfile, RecognitionConfig};
    use crate::ocr::TextRecognizer;
    use crate::pdf::{PageRange, PageRasterizer};

    /// Blank pages of a fixed size.
    pub struct BlankPages {
        pub pages: u32,
        pub width: u32,
        pub height: u32,
    }

    impl PageRasterizer for BlankPages {
        fn page_count(&self, _path: &Path) -> Result<u32, PdfError> {
            Ok(self.pages)
        }

        fn rasterize(
            &self,
            path: &Path,
            range: PageRange,
            _dpi: u32,
        ) -> Result<Vec<DynamicImage>, PdfError> {
            let (first, last) = range.resolve(self.page_count(path)?)?;
            Ok((first..=last)
                .map(|_| {
                    DynamicImage::ImageLuma8(GrayImage::from_pixel(
                        self.width,
                        self.height,
                        Luma([255]),
                    ))
                })
                .collect())
        }
    }

    /// Detector answering from a closure over the profile.
    pub struct ProfileDetector<F>(pub F);

    impl<F> BoxDetector for ProfileDetector<F>
    where
        F: Fn(&DetectionProfile) -> Vec<BoundingBox>,
    {
        fn detect(&self, _image: &GrayImage, profile: &DetectionProfile) -> Vec<BoundingBox> {
            (self.0)(profile)
        }
    }

    /// Recognizer replaying canned text in call order.
    pub struct ScriptedText {
        texts: RefCell<VecDeque<String>>,
    }

    impl ScriptedText {
        pub fn new(texts: &[&str]) -> Self {
            Self {
                texts: RefCell::new(texts.iter().map(|t| t.to_string()).collect()),
            }
        }
    }

    impl TextRecognizer for ScriptedText {
        fn recognize(
            &self,
            _image: &DynamicImage,
            _config: &RecognitionConfig,
        ) -> Result<String, OcrError> {
            self.texts
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| OcrError::Recognition("no scripted text left".to_string()))
        }
    }
}
