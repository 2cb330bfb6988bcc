//! Collaborator contracts.
//!
//! The structure pass never touches PDF internals directly. It talks to a
//! [`Backend`] that opens two independent sessions on the input file, one
//! for text and tables and one for images, and exposes an ordered chain of
//! fallback [`TableReader`]s. Sessions are released when dropped.
//!
//! [`LopdfBackend`] is the default implementation.

mod images;
mod layout;
mod lopdf_backend;
mod table_detector;

use std::path::Path;

use crate::error::Result;

pub use images::LopdfImageSession;
pub use layout::{LayoutConfig, TextLine, TextSpan};
pub use lopdf_backend::{LopdfBackend, LopdfTextSession, StreamTableReader};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};

/// A raw table cell as delivered by a collaborator; `None` for a missing cell.
pub type RawCell = Option<String>;

/// A raw table: rows of cells, not necessarily rectangular.
pub type RawTable = Vec<Vec<RawCell>>;

/// PDF object identifier: (object number, generation number).
pub type ObjectId = (u32, u16);

/// A table returned by a fallback reader, split into header and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderedTable {
    pub header: Vec<RawCell>,
    pub rows: Vec<Vec<RawCell>>,
}

impl HeaderedTable {
    /// Flatten to `[header] + rows`.
    pub fn into_grid(self) -> RawTable {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.header);
        grid.extend(self.rows);
        grid
    }

    /// Check if the table has no body rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reference to an embedded image, valid within the session that listed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub object_id: ObjectId,
    /// Resource name on the page (e.g. `Im1`)
    pub name: String,
}

/// Decoded image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// File extension of `data` (e.g. `jpeg`, `png`)
    pub format: String,
}

/// An open document used by the text pass. Pages are 1-based.
pub trait TextSession {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Page height in points.
    fn page_height(&self, page: u32) -> Result<f32>;

    /// Full text of a page as newline-separated lines, `None` when the page
    /// has no extractable text. Blank lines mark paragraph breaks.
    fn page_text(&self, page: u32) -> Result<Option<String>>;

    /// Tables found on a page, in page order.
    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>>;
}

/// A secondary table source consulted for pages where the primary source
/// yields nothing. Readers work from the file path and manage their own
/// document access.
pub trait TableReader {
    /// Short name used in item descriptions and logs.
    fn name(&self) -> &str;

    /// Read the tables of one page (1-based).
    fn read_tables(&self, path: &Path, page: u32) -> Result<Vec<HeaderedTable>>;
}

/// An open document used by the image pass. Pages are 1-based.
pub trait ImageSession {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Images placed on a page, in resource order.
    fn list_images(&self, page: u32) -> Result<Vec<ImageRef>>;

    /// Decode one image.
    fn extract_image(&self, image: &ImageRef) -> Result<ExtractedImage>;
}

/// Factory for collaborator sessions.
pub trait Backend {
    type Text: TextSession;
    type Images: ImageSession;

    /// Open the document for the text and table pass.
    fn open_text(&self, path: &Path) -> Result<Self::Text>;

    /// Open the document a second, independent time for the image pass.
    fn open_images(&self, path: &Path) -> Result<Self::Images>;

    /// Fallback table readers, tried in order.
    fn table_readers(&self) -> &[Box<dyn TableReader>];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headered_table_into_grid() {
        let table = HeaderedTable {
            header: vec![Some("Item".into()), Some("Qty".into())],
            rows: vec![vec![Some("Bolt".into()), Some("4".into())]],
        };
        assert!(!table.is_empty());

        let grid = table.into_grid();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][0].as_deref(), Some("Item"));
        assert_eq!(grid[1][1].as_deref(), Some("4"));
    }
}
