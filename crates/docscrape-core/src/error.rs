//! Error types for the docscrape-core library.

use thiserror::Error;

use crate::files::DocumentKind;
use crate::models::case::FieldKind;

/// Main error type for the docscrape library.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Document lookup error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Box location error.
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Field parsing error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Tabular I/O error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while locating a case's documents on disk.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No file matched the case number and document kind.
    #[error("could not find {kind} for case {case}")]
    FileNotFoundForCase { case: String, kind: DocumentKind },

    /// More than one file matched.
    #[error("found {count} {kind} files for case {case}")]
    AmbiguousFileMatch {
        case: String,
        kind: DocumentKind,
        count: usize,
    },

    /// The document directory could not be read.
    #[error("failed to read document directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The document is shorter than the page range we need.
    #[error("document has {found} pages but at least {required} are required")]
    InsufficientPages { required: u32, found: u32 },

    /// The rasterizer failed or produced no images.
    #[error("failed to render pages: {0}")]
    Render(String),

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition engine could not be started.
    #[error("failed to start recognition engine {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised by the box locator and disambiguator.
#[derive(Error, Debug)]
pub enum LocateError {
    /// Rotation sweep exhausted without enough boxes.
    #[error(
        "could not detect {field} box ({found} of {required} found) within +-{max_angle} degrees of rotation"
    )]
    BoxNotFound {
        field: FieldKind,
        found: usize,
        required: usize,
        max_angle: f32,
    },

    /// Candidate boxes could not be reduced to a single box.
    #[error("could not disambiguate {field} box: {candidates} candidates remain")]
    AmbiguousField { field: FieldKind, candidates: usize },
}

/// Errors raised while parsing recognized text into field values.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The label anchor could not be found, or nothing followed it.
    #[error("could not find {field} label in: {raw:?}")]
    FieldParse { field: FieldKind, raw: String },

    /// The mandatory five-digit zip prefix is not numeric.
    #[error("the first 5 characters of the zip code should be all digits, but instead found: {found:?}")]
    ZipDigits { found: String },

    /// The street address does not contain a building number.
    #[error("street address does not start with a building number: {raw:?}")]
    StreetNumber { raw: String },

    /// None of the demand patterns matched.
    #[error("could not find initial demand on first or second page")]
    DemandNotFound,
}

/// Result type for the docscrape library.
pub type Result<T> = std::result::Result<T, ScrapeError>;
