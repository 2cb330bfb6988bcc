//! [`Backend`] implementation backed by `lopdf`.

use std::path::Path;

use lopdf::{Document as LopdfDocument, Object};

use crate::detect::sniff_path;
use crate::error::{Error, Result};

use super::images::LopdfImageSession;
use super::layout::{extract_page_spans, group_into_lines, render_text, LayoutConfig};
use super::table_detector::{TableDetector, TableDetectorConfig};
use super::{Backend, HeaderedTable, ObjectId, RawTable, TableReader, TextSession};

/// US Letter height, used when a page carries no usable MediaBox.
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Default collaborator set: positioned-text layout for page text, strict
/// alignment detection for primary tables, and a relaxed [`StreamTableReader`]
/// as the single fallback.
pub struct LopdfBackend {
    layout: LayoutConfig,
    tables: TableDetectorConfig,
    readers: Vec<Box<dyn TableReader>>,
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self {
            layout: LayoutConfig::default(),
            tables: TableDetectorConfig::strict(),
            readers: vec![Box::new(StreamTableReader::default())],
        }
    }

    /// Set line grouping and paragraph break tuning.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the detector configuration of the primary table source.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.tables = config;
        self
    }

    /// Replace the fallback chain with a single stream reader using `config`.
    pub fn with_fallback_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.readers = vec![Box::new(StreamTableReader::new(config))];
        self
    }

    /// Append a fallback table reader.
    pub fn with_reader<R: TableReader + 'static>(mut self, reader: R) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    /// Remove all fallback table readers.
    pub fn without_readers(mut self) -> Self {
        self.readers.clear();
        self
    }
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for LopdfBackend {
    type Text = LopdfTextSession;
    type Images = LopdfImageSession;

    fn open_text(&self, path: &Path) -> Result<Self::Text> {
        Ok(LopdfTextSession {
            doc: load_document(path)?,
            layout: self.layout,
            detector: TableDetector::with_config(self.tables.clone()),
        })
    }

    fn open_images(&self, path: &Path) -> Result<Self::Images> {
        LopdfImageSession::open(path)
    }

    fn table_readers(&self) -> &[Box<dyn TableReader>] {
        &self.readers
    }
}

/// Text and table session over a loaded document.
pub struct LopdfTextSession {
    doc: LopdfDocument,
    layout: LayoutConfig,
    detector: TableDetector,
}

impl TextSession for LopdfTextSession {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn page_height(&self, page: u32) -> Result<f32> {
        let page_id = page_id(&self.doc, page)?;

        let height = inherited_attribute(&self.doc, page_id, b"MediaBox")
            .and_then(|obj| resolve(&self.doc, obj).as_array().ok())
            .filter(|arr| arr.len() >= 4)
            .and_then(|arr| {
                let y0 = number(resolve(&self.doc, &arr[1]))?;
                let y1 = number(resolve(&self.doc, &arr[3]))?;
                Some((y1 - y0).abs())
            })
            .filter(|h| *h > 0.0)
            .unwrap_or(DEFAULT_PAGE_HEIGHT);

        Ok(height)
    }

    fn page_text(&self, page: u32) -> Result<Option<String>> {
        let spans = extract_page_spans(&self.doc, page)?;
        if spans.is_empty() {
            return Ok(None);
        }

        let lines = group_into_lines(spans, &self.layout);
        let text = render_text(&lines, &self.layout);
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>> {
        let spans = extract_page_spans(&self.doc, page)?;
        Ok(self
            .detector
            .detect(&spans)
            .iter()
            .map(|t| t.to_grid())
            .collect())
    }
}

/// Fallback reader using relaxed alignment detection.
///
/// Opens the file for every request; the first detected row becomes the
/// header.
#[derive(Debug, Clone)]
pub struct StreamTableReader {
    detector: TableDetector,
}

impl StreamTableReader {
    pub fn new(config: TableDetectorConfig) -> Self {
        Self {
            detector: TableDetector::with_config(config),
        }
    }
}

impl Default for StreamTableReader {
    fn default() -> Self {
        Self::new(TableDetectorConfig::relaxed())
    }
}

impl TableReader for StreamTableReader {
    fn name(&self) -> &str {
        "stream"
    }

    fn read_tables(&self, path: &Path, page: u32) -> Result<Vec<HeaderedTable>> {
        let doc = load_document(path)?;
        let spans = extract_page_spans(&doc, page)
            .map_err(|e| Error::TableExtract(format!("page {}: {}", page, e)))?;

        Ok(self
            .detector
            .detect(&spans)
            .iter()
            .map(|t| t.to_headered())
            .collect())
    }
}

/// Validate the header and load a document.
pub(super) fn load_document(path: &Path) -> Result<LopdfDocument> {
    let header = sniff_path(path)?;
    let doc = LopdfDocument::load(path)?;
    log::debug!(
        "Loaded {} ({}, {} pages)",
        path.display(),
        header,
        doc.get_pages().len()
    );
    Ok(doc)
}

/// Object id of a 1-based page.
pub(super) fn page_id(doc: &LopdfDocument, page: u32) -> Result<ObjectId> {
    let pages = doc.get_pages();
    pages
        .get(&page)
        .copied()
        .ok_or(Error::PageOutOfRange(page, pages.len() as u32))
}

/// Look up a page attribute, walking up the `Parent` chain of the page tree.
pub(super) fn inherited_attribute<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk guards against cyclic Parent links
    for _ in 0..32 {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a reference to its target; other objects are returned as is.
pub(super) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_inherited_media_box() -> (LopdfDocument, ObjectId) {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    #[test]
    fn test_inherited_attribute_walks_parent() {
        let (doc, page_id) = doc_with_inherited_media_box();
        let media_box = inherited_attribute(&doc, page_id, b"MediaBox").unwrap();
        assert_eq!(media_box.as_array().unwrap().len(), 4);
        assert!(inherited_attribute(&doc, page_id, b"Rotate").is_none());
    }

    #[test]
    fn test_page_height_from_parent() {
        let (doc, _) = doc_with_inherited_media_box();
        let session = LopdfTextSession {
            doc,
            layout: LayoutConfig::default(),
            detector: TableDetector::new(),
        };
        assert_eq!(session.page_count(), 1);
        assert_eq!(session.page_height(1).unwrap(), 842.0);
        assert!(matches!(
            session.page_height(2),
            Err(Error::PageOutOfRange(2, 1))
        ));
    }

    #[test]
    fn test_page_without_contents_has_no_text() {
        let (doc, _) = doc_with_inherited_media_box();
        let session = LopdfTextSession {
            doc,
            layout: LayoutConfig::default(),
            detector: TableDetector::new(),
        };
        assert_eq!(session.page_text(1).unwrap(), None);
        assert!(session.page_tables(1).unwrap().is_empty());
    }

    #[test]
    fn test_default_backend_has_stream_reader() {
        let backend = LopdfBackend::new();
        let names: Vec<&str> = backend.table_readers().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["stream"]);
        assert!(LopdfBackend::new().without_readers().table_readers().is_empty());

        let replaced = LopdfBackend::new()
            .without_readers()
            .with_fallback_table_config(TableDetectorConfig::strict());
        assert_eq!(replaced.table_readers().len(), 1);
    }
}
