//! # pdfjson
//!
//! Structured PDF content extraction for Rust.
//!
//! This library turns a PDF into a hierarchical JSON document: one entry per
//! page, each holding paragraphs, tables and charts in reading order, every
//! item tagged with the section and subsection it was found under.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfjson::{extract_file, render};
//!
//! fn main() -> pdfjson::Result<()> {
//!     let doc = extract_file("report.pdf")?;
//!
//!     render::write_json(&doc, "report.json", render::JsonFormat::Pretty)?;
//!     println!("{} pages, {} items", doc.page_count(), doc.item_count());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Section tracking**: headings recognized by pattern tag all following content
//! - **Tables**: alignment-based detection with a relaxed fallback reader
//! - **Charts**: embedded images recorded with size and format
//! - **Pluggable collaborators**: swap the PDF layer through [`backend::Backend`]

pub mod backend;
pub mod detect;
pub mod error;
pub mod extractor;
pub mod model;
pub mod options;
pub mod render;
pub mod structure;

// Re-export commonly used types
pub use backend::{
    Backend, ImageSession, LayoutConfig, LopdfBackend, StreamTableReader, TableDetectorConfig,
    TableReader, TextSession,
};
pub use detect::{is_pdf, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use extractor::Extractor;
pub use model::{
    ChartItem, ContentItem, Document, ImageInfo, Metadata, Page, ParagraphItem, SectionContext,
    TableItem,
};
pub use options::ExtractOptions;
pub use render::{to_json, write_json, JsonFormat};

use std::path::Path;

/// Extract a PDF file with the default backend and options.
///
/// # Example
///
/// ```no_run
/// use pdfjson::extract_file;
///
/// let doc = extract_file("report.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Extractor::new().extract(path)
}

/// Extract a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfjson::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().with_fallback_tables(false);
/// let doc = extract_file_with_options("report.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Document> {
    Extractor::new().with_options(options).extract(path)
}
