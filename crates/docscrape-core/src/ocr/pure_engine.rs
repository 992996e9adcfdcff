//! In-process recognition using `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use super::TextRecognizer;
use crate::error::OcrError;
use crate::models::config::RecognitionConfig;

/// Recognizer backed by PaddleOCR models loaded with `pure-onnx-ocr`.
pub struct PureOcrRecognizer {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

/// One recognized line with the top-left corner used for ordering.
struct RecognizedLine {
    x: f64,
    y: f64,
    text: String,
}

impl PureOcrRecognizer {
    /// Load detection, recognition and dictionary files from a directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());
        Ok(Self { engine })
    }

    /// Load models from `config.model_dir`.
    pub fn from_config(config: &RecognitionConfig) -> Result<Self, OcrError> {
        let dir = config
            .model_dir
            .as_deref()
            .ok_or_else(|| OcrError::ModelLoad("no model directory configured".to_string()))?;
        Self::from_dir(dir)
    }
}

impl TextRecognizer for PureOcrRecognizer {
    fn recognize(&self, image: &DynamicImage, _config: &RecognitionConfig) -> Result<String, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let mut lines: Vec<RecognizedLine> = results
            .iter()
            .map(|r| {
                let (x, y) = r
                    .bounding_box
                    .exterior()
                    .coords()
                    .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| {
                        (x.min(c.x), y.min(c.y))
                    });
                RecognizedLine {
                    x,
                    y,
                    text: r.text.replace("[UNK]", " "),
                }
            })
            .collect();

        // Reading order: 20px row bands, then left to right.
        lines.sort_by(|a, b| {
            let row_a = (a.y / 20.0) as i64;
            let row_b = (b.y / 20.0) as i64;
            row_a
                .cmp(&row_b)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            "pure-onnx-ocr returned {} lines for {}x{} image in {}ms",
            lines.len(),
            width,
            height,
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
