//! CLI command implementations.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::debug;

use docscrape_core::models::config::ScrapeConfig;
use docscrape_core::{
    CasePipeline, ContourBoxDetector, ExtractionTarget, PopplerRasterizer, TesseractRecognizer,
    TextRecognizer,
};

pub(crate) type Pipeline =
    CasePipeline<PopplerRasterizer, ContourBoxDetector, Box<dyn TextRecognizer>>;

/// Fields to extract.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FieldArg {
    /// Mailing address from the civil case cover sheet
    Address,
    /// Initial demand from the complaint
    Demand,
    /// Both
    All,
}

impl From<FieldArg> for ExtractionTarget {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Address => ExtractionTarget::Address,
            FieldArg::Demand => ExtractionTarget::Demand,
            FieldArg::All => ExtractionTarget::All,
        }
    }
}

pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docscrape")
        .join("config.json")
}

/// Config file named on the command line, else the default location.
pub(crate) fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the explicit config, else the default file if present, else defaults.
pub(crate) fn load_config(explicit: Option<&str>) -> anyhow::Result<ScrapeConfig> {
    if let Some(path) = explicit {
        return Ok(ScrapeConfig::from_file(Path::new(path))?);
    }
    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(ScrapeConfig::from_file(&path)?)
    } else {
        Ok(ScrapeConfig::default())
    }
}

/// Pipeline over `docs` with the configured rasterizer and recognizer.
pub(crate) fn build_pipeline(
    docs: &Path,
    config: &ScrapeConfig,
    dump_crops: Option<&Path>,
) -> anyhow::Result<Pipeline> {
    if !docs.is_dir() {
        anyhow::bail!("Document directory not found: {}", docs.display());
    }

    let pipeline = CasePipeline::new(
        docs,
        config,
        PopplerRasterizer::from_config(&config.raster),
        ContourBoxDetector::new(),
        recognizer(config)?,
    )?;

    Ok(match dump_crops {
        Some(dir) => pipeline.with_crop_dump(dir),
        None => pipeline,
    })
}

fn recognizer(config: &ScrapeConfig) -> anyhow::Result<Box<dyn TextRecognizer>> {
    #[cfg(feature = "onnx")]
    if let Some(dir) = &config.ocr.model_dir {
        debug!("Using pure-onnx-ocr models from {}", dir.display());
        return Ok(Box::new(docscrape_core::PureOcrRecognizer::from_dir(dir)?));
    }

    #[cfg(not(feature = "onnx"))]
    if config.ocr.model_dir.is_some() {
        tracing::warn!("ocr.model_dir is set but docscrape was built without ONNX support, using tesseract");
    }

    Ok(Box::new(TesseractRecognizer::new()))
}
