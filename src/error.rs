//! Error types for pdfjson.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfjson operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting or persisting a document.
///
/// Only [`Error::InputNotFound`], a failure to open the document for the
/// text pass, and [`Error::OutputWrite`] ever reach the caller of an
/// extraction run. The remaining variants are produced by collaborators and
/// downgraded to empty results at page or item granularity.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not exist.
    #[error("PDF file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error extracting tables.
    #[error("Table extraction error: {0}")]
    TableExtract(String),

    /// Error extracting images from PDF.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error serializing the document.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Failure while persisting the JSON result.
    #[error("Error saving JSON file {}: {source}", path.display())]
    OutputWrite {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageExtract(err.to_string())
    }
}
