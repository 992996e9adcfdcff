//! Recognition through the `tesseract` command-line engine.

use std::process::Command;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use super::TextRecognizer;
use crate::error::OcrError;
use crate::models::config::RecognitionConfig;

/// Recognizer that writes the image to a temporary PNG and runs `tesseract` on it.
///
/// Character whitelists are not passed: the LSTM engine (`--oem 1`) ignores them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TesseractRecognizer;

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Command-line arguments after the input and output names.
    fn engine_args(config: &RecognitionConfig) -> Vec<String> {
        let mut args = vec![
            "--oem".to_string(),
            config.engine_mode.to_string(),
            "--dpi".to_string(),
            config.dpi.to_string(),
        ];
        if let Some(lang) = &config.language {
            args.push("-l".to_string());
            args.push(lang.clone());
        }
        if let Some(psm) = config.page_segmentation_mode {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        let start = Instant::now();
        let temp_dir = tempfile::tempdir()
            .map_err(|e| OcrError::Recognition(format!("failed to create temp dir: {}", e)))?;
        let input = temp_dir.path().join("field.png");
        image
            .save(&input)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let program = &config.tesseract_path;
        let output = Command::new(program)
            .arg(&input)
            .arg("stdout")
            .args(Self::engine_args(config))
            .output()
            .map_err(|source| OcrError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Recognition(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "Recognized {} chars from {}x{} image in {}ms",
            text.len(),
            width,
            height,
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
