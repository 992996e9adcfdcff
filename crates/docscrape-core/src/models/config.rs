//! Configuration structures for the scraping pipeline.
//!
//! Pixel constants in a [`TemplateProfile`] are calibration data for one form
//! layout rendered at a fixed DPI. New layouts are added as new entries in
//! [`ScrapeConfig::templates`] rather than by changing code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::models::case::FieldKind;

/// Key of the built-in template.
pub const DEFAULT_TEMPLATE: &str = "civil-case/v1";

/// Main configuration for the docscrape pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Template used for this run.
    pub active_template: String,

    /// Known form layouts keyed by template identity.
    pub templates: BTreeMap<String, TemplateProfile>,

    /// PDF rasterization configuration.
    pub raster: RasterConfig,

    /// Recognition engine configuration.
    pub ocr: RecognitionConfig,

    /// Input/output table configuration.
    pub batch: BatchConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(DEFAULT_TEMPLATE.to_string(), TemplateProfile::default());
        Self {
            active_template: DEFAULT_TEMPLATE.to_string(),
            templates,
            raster: RasterConfig::default(),
            ocr: RecognitionConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// Parameters handed to the box detector for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionProfile {
    /// Accepted box widths in source pixels.
    pub width_range: Interval<u32>,

    /// Accepted box heights in source pixels.
    pub height_range: Interval<u32>,

    /// Accepted width/height ratios.
    pub ratio_range: Interval<f32>,

    /// Resize factors the detector runs at.
    pub scaling_factors: Vec<f32>,

    /// Dilation passes applied to the ruling-line mask.
    pub dilation_iterations: u8,

    /// Accepted number of cells in a box's row group. Starting at 2 skips
    /// isolated boxes such as checkboxes.
    pub group_size_range: Interval<usize>,

    /// Boxes needed before the locator stops searching.
    pub required_boxes: usize,
}

impl DetectionProfile {
    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |what: &str| {
            Err(ScrapeError::Config(format!(
                "{} profile has an empty {} range",
                name, what
            )))
        };
        if !self.width_range.is_valid() {
            return invalid("width");
        }
        if !self.height_range.is_valid() {
            return invalid("height");
        }
        if !self.ratio_range.is_valid() {
            return invalid("aspect ratio");
        }
        if !self.group_size_range.is_valid() {
            return invalid("group size");
        }
        if self.scaling_factors.is_empty() || self.scaling_factors.iter().any(|s| *s <= 0.0) {
            return Err(ScrapeError::Config(format!(
                "{} profile needs at least one positive scaling factor",
                name
            )));
        }
        if self.required_boxes == 0 {
            return Err(ScrapeError::Config(format!(
                "{} profile must require at least one box",
                name
            )));
        }
        Ok(())
    }
}

/// Extra pixels added around a detected box before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    pub fn uniform(px: u32) -> Self {
        Self {
            top: px,
            bottom: px,
            left: px,
            right: px,
        }
    }
}

/// Bounded sweep over small rotation corrections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationSweep {
    /// Increment between attempted magnitudes, in degrees.
    pub step_deg: f32,
    /// Exclusive bound on the attempted magnitude, in degrees.
    pub max_deg: f32,
}

impl Default for RotationSweep {
    fn default() -> Self {
        Self {
            step_deg: 0.1,
            max_deg: 2.0,
        }
    }
}

/// Row band the state and zip boxes must sit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalWindow {
    /// Box top must be strictly greater than this.
    pub min_top: u32,
    /// Box bottom must be strictly less than this.
    pub max_bottom: u32,
}

impl VerticalWindow {
    pub fn admits(&self, bbox: &crate::models::case::BoundingBox) -> bool {
        bbox.top > self.min_top && bbox.bottom() < self.max_bottom
    }
}

/// Detection profiles for the address fields. State and zip share one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfiles {
    pub street: DetectionProfile,
    pub city: DetectionProfile,
    pub state_zip: DetectionProfile,
}

impl Default for FieldProfiles {
    fn default() -> Self {
        Self {
            street: DetectionProfile {
                width_range: Interval::new(800, 1500),
                height_range: Interval::new(150, 500),
                ratio_range: Interval::new(0.5, 12.0),
                scaling_factors: vec![0.7],
                dilation_iterations: 5,
                group_size_range: Interval::new(2, 100),
                required_boxes: 1,
            },
            city: DetectionProfile {
                width_range: Interval::new(250, 850),
                height_range: Interval::new(90, 210),
                ratio_range: Interval::new(1.5, 7.0),
                scaling_factors: vec![0.7],
                dilation_iterations: 2,
                group_size_range: Interval::new(2, 100),
                required_boxes: 1,
            },
            state_zip: DetectionProfile {
                width_range: Interval::new(150, 450),
                height_range: Interval::new(90, 210),
                ratio_range: Interval::new(0.6, 5.0),
                scaling_factors: vec![0.7],
                dilation_iterations: 2,
                group_size_range: Interval::new(2, 100),
                required_boxes: 2,
            },
        }
    }
}

/// Crop padding per address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPaddings {
    pub street: Padding,
    pub city: Padding,
    pub state: Padding,
    pub zip: Padding,
}

impl Default for FieldPaddings {
    fn default() -> Self {
        Self {
            street: Padding::uniform(30),
            city: Padding {
                top: 10,
                bottom: 10,
                left: 50,
                right: 10,
            },
            state: Padding::uniform(10),
            // Extra room below for a +4 suffix wrapped onto a second line.
            zip: Padding {
                top: 10,
                bottom: 40,
                left: 10,
                right: 10,
            },
        }
    }
}

/// Layout of the civil case cover sheet's address page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverSheetLayout {
    /// First page (1-indexed) of the range holding the address page.
    /// The last rendered page of the range is used.
    pub address_first_page: u32,

    /// Rows removed from the top of the page before detection.
    pub top_crop: u32,

    /// Fraction of the page height kept for detection.
    pub working_height_fraction: f32,

    /// Columns left of this offset are excluded from the street search.
    pub street_search_left: u32,

    pub profiles: FieldProfiles,

    pub padding: FieldPaddings,

    /// Applied when more than two state/zip candidates are found.
    pub state_zip_window: VerticalWindow,

    pub rotation: RotationSweep,
}

impl Default for CoverSheetLayout {
    fn default() -> Self {
        Self {
            address_first_page: 6,
            top_crop: 300,
            working_height_fraction: 0.5,
            street_search_left: 1000,
            profiles: FieldProfiles::default(),
            padding: FieldPaddings::default(),
            state_zip_window: VerticalWindow {
                min_top: 650,
                max_bottom: 1700,
            },
            rotation: RotationSweep::default(),
        }
    }
}

impl CoverSheetLayout {
    pub fn profile(&self, field: FieldKind) -> &DetectionProfile {
        match field {
            FieldKind::StreetAddress => &self.profiles.street,
            FieldKind::City => &self.profiles.city,
            FieldKind::State | FieldKind::Zip => &self.profiles.state_zip,
        }
    }

    pub fn padding(&self, field: FieldKind) -> Padding {
        match field {
            FieldKind::StreetAddress => self.padding.street,
            FieldKind::City => self.padding.city,
            FieldKind::State => self.padding.state,
            FieldKind::Zip => self.padding.zip,
        }
    }
}

/// Layout of the complaint's opening pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintLayout {
    /// Leading pages searched for the demand.
    pub demand_pages: u32,

    /// Amounts above this are flagged for review.
    pub soft_ceiling: Decimal,
}

impl Default for ComplaintLayout {
    fn default() -> Self {
        Self {
            demand_pages: 2,
            soft_ceiling: Decimal::new(25_000_00, 2),
        }
    }
}

/// One versioned form template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateProfile {
    pub version: u32,

    pub description: String,

    pub cover_sheet: CoverSheetLayout,

    pub complaint: ComplaintLayout,
}

impl Default for TemplateProfile {
    fn default() -> Self {
        Self {
            version: 1,
            description: "Civil case cover sheet and complaint, 300 DPI scans".to_string(),
            cover_sheet: CoverSheetLayout::default(),
            complaint: ComplaintLayout::default(),
        }
    }
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// DPI for rendering PDF pages. Template pixel constants assume 300.
    pub dpi: u32,

    /// Path to the `pdftoppm` executable.
    pub pdftoppm_path: PathBuf,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            pdftoppm_path: PathBuf::from("pdftoppm"),
        }
    }
}

/// Recognition engine configuration.
///
/// Built once at startup and passed by reference into every recognition call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Path to the `tesseract` executable.
    pub tesseract_path: PathBuf,

    /// OCR engine mode. 1 selects the LSTM engine, which ignores character
    /// whitelists.
    pub engine_mode: u8,

    /// DPI hint passed to the engine.
    pub dpi: u32,

    /// Language code (e.g. "eng").
    pub language: Option<String>,

    /// Page segmentation mode.
    pub page_segmentation_mode: Option<u8>,

    /// Model directory for the in-process ONNX recognizer.
    pub model_dir: Option<PathBuf>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            engine_mode: 1,
            dpi: 300,
            language: None,
            page_segmentation_mode: None,
            model_dir: None,
        }
    }
}

/// Column names and document labels of the case table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub case_column: String,

    pub document_column: String,

    /// Document-column value of rows that receive address results.
    pub cover_sheet_label: String,

    /// Document-column value of rows that receive demand results.
    pub complaint_label: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            case_column: "case_number".to_string(),
            document_column: "Document".to_string(),
            cover_sheet_label: "Civil Case Cover Sheet".to_string(),
            complaint_label: "Complaint".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ScrapeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The template selected by `active_template`.
    pub fn template(&self) -> Result<&TemplateProfile> {
        self.templates.get(&self.active_template).ok_or_else(|| {
            ScrapeError::Config(format!("unknown template: {}", self.active_template))
        })
    }

    /// Check every template's ranges and sweep parameters.
    pub fn validate(&self) -> Result<()> {
        self.template()?;

        for (key, template) in &self.templates {
            let layout = &template.cover_sheet;
            layout.profiles.street.validate(&format!("{} street", key))?;
            layout.profiles.city.validate(&format!("{} city", key))?;
            layout.profiles.state_zip.validate(&format!("{} state/zip", key))?;

            if layout.rotation.step_deg <= 0.0 || layout.rotation.max_deg < 0.0 {
                return Err(ScrapeError::Config(format!(
                    "{} rotation sweep needs a positive step and non-negative bound",
                    key
                )));
            }
            if !(layout.working_height_fraction > 0.0 && layout.working_height_fraction <= 1.0) {
                return Err(ScrapeError::Config(format!(
                    "{} working height fraction must be in (0, 1]",
                    key
                )));
            }
            if layout.address_first_page == 0 || template.complaint.demand_pages == 0 {
                return Err(ScrapeError::Config(format!(
                    "{} page numbers are 1-indexed",
                    key
                )));
            }
        }

        if self.raster.dpi == 0 {
            return Err(ScrapeError::Config("raster DPI must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScrapeConfig::default();
        config.validate().unwrap();

        let template = config.template().unwrap();
        assert_eq!(template.cover_sheet.address_first_page, 6);
        assert_eq!(template.complaint.soft_ceiling, Decimal::new(2_500_000, 2));
        assert_eq!(
            template.cover_sheet.profile(FieldKind::Zip).required_boxes,
            2
        );
        assert_eq!(template.cover_sheet.padding(FieldKind::Zip).bottom, 40);
    }

    #[test]
    fn test_empty_range_is_rejected() {
        let mut config = ScrapeConfig::default();
        let template = config.templates.get_mut(DEFAULT_TEMPLATE).unwrap();
        template.cover_sheet.profiles.city.width_range = Interval::new(850, 250);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let config = ScrapeConfig {
            active_template: "missing/v9".to_string(),
            ..ScrapeConfig::default()
        };
        assert!(config.template().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ScrapeConfig::default();
        config.ocr.language = Some("eng".to_string());
        config.save(&path).unwrap();

        let loaded = ScrapeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language.as_deref(), Some("eng"));
        assert_eq!(loaded.template().unwrap(), config.template().unwrap());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "raster": { "dpi": 300 } }"#).unwrap();

        let loaded = ScrapeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.active_template, DEFAULT_TEMPLATE);
        assert_eq!(loaded.batch.case_column, "case_number");
    }
}
