//! Text recognition adapters.
//!
//! Recognition engines are external collaborators: they turn a cropped field
//! image or a full page into raw text. Engine settings travel with each call
//! as a [`RecognitionConfig`] value.

mod tesseract;
#[cfg(feature = "onnx")]
mod pure_engine;

pub use tesseract::TesseractRecognizer;
#[cfg(feature = "onnx")]
pub use pure_engine::PureOcrRecognizer;

use image::DynamicImage;

use crate::error::OcrError;
use crate::models::config::RecognitionConfig;

/// Runs OCR over an image and returns its raw text.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(&self, image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError> {
        (**self).recognize(image, config)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError> {
        (**self).recognize(image, config)
    }
}
