//! Output model for extracted documents.
//!
//! The model mirrors the persisted JSON: a [`Document`] holds a metadata
//! envelope and one [`Page`] per source page, each page carrying its
//! [`ContentItem`]s in reconstructed reading order.

mod content;
mod document;
mod page;

pub use content::{ChartItem, ContentItem, ImageInfo, ParagraphItem, SectionContext, TableItem};
pub use document::{Document, Metadata};
pub use page::Page;
