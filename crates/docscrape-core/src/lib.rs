//! Core library for scraping civil case documents.
//!
//! This crate provides:
//! - File resolution by case-number naming convention
//! - PDF rasterization and OCR adapters (poppler, tesseract, optional ONNX)
//! - Form box detection with a bounded rotation sweep
//! - Address and initial-demand field parsing tolerant of OCR noise
//! - Per-case pipelines and a batch driver over case tables

pub mod batch;
pub mod error;
pub mod extract;
pub mod files;
pub mod layout;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use batch::{BatchDriver, BatchSummary, CaseTable, ExtractionTarget};
pub use error::{ScrapeError, Result};
pub use extract::{parse_address, parse_demand};
pub use files::{resolve, DocumentKind};
pub use layout::{BoxDetector, BoxLocator, ContourBoxDetector};
pub use models::case::{
    BoundingBox, CaseId, DemandSource, ExtractedAddress, ExtractedDemand, FieldKind,
};
pub use models::config::ScrapeConfig;
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use pdf::{PageRange, PageRasterizer, PopplerRasterizer};
pub use pipeline::{CaseExtractor, CaseFailure, CasePipeline, Stage};

#[cfg(feature = "onnx")]
pub use ocr::PureOcrRecognizer;
