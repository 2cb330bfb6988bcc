//! Document builder: runs the text pass and the image pass over one file.

use std::path::Path;

use crate::backend::{Backend, LopdfBackend, TableReader, TextSession};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page};
use crate::options::ExtractOptions;
use crate::structure::{ImageAnnotator, PageAssembler, SectionCursor};

/// Extracts a [`Document`] from a PDF file.
///
/// The document is opened twice: once for text and tables, reused across
/// all pages, and once more for images after every page is assembled. Each
/// session is dropped at the end of its pass.
///
/// # Example
///
/// ```no_run
/// use pdfjson::{ExtractOptions, Extractor};
///
/// let extractor = Extractor::new().with_options(ExtractOptions::new().text_only());
/// let doc = extractor.extract("report.pdf")?;
/// println!("{} pages", doc.page_count());
/// # Ok::<(), pdfjson::Error>(())
/// ```
pub struct Extractor<B: Backend = LopdfBackend> {
    backend: B,
    options: ExtractOptions,
}

impl Extractor<LopdfBackend> {
    /// Create an extractor over the default `lopdf` backend.
    pub fn new() -> Self {
        Self::with_backend(LopdfBackend::default())
    }
}

impl Default for Extractor<LopdfBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Extractor<B> {
    /// Create an extractor over a custom backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: ExtractOptions::default(),
        }
    }

    /// Set extraction options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the document at `path`.
    ///
    /// Fails with [`Error::InputNotFound`] before any collaborator is opened
    /// when the path does not exist, and with the backend's error when the
    /// text session cannot be opened. Every later failure is confined to the
    /// page, table or image it concerns.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }

        log::info!("Extracting {}", path.display());

        // One cursor per run, carried across pages and into the image pass
        let mut cursor = SectionCursor::new();
        let mut doc = self.text_pass(path, &mut cursor)?;

        if self.options.extract_images {
            self.image_pass(path, &cursor, &mut doc);
        }

        doc.metadata.touch();
        log::info!(
            "Extracted {} pages, {} items from {}",
            doc.page_count(),
            doc.item_count(),
            path.display()
        );
        Ok(doc)
    }

    fn text_pass(&self, path: &Path, cursor: &mut SectionCursor) -> Result<Document> {
        let session = self.backend.open_text(path)?;
        let total_pages = session.page_count();
        let mut doc = Document::new(Metadata::new(path.display().to_string(), total_pages));

        let readers: &[Box<dyn TableReader>] = if self.options.fallback_tables {
            self.backend.table_readers()
        } else {
            &[]
        };
        let assembler = PageAssembler::new(&session, path).with_readers(readers);

        for page in 1..=total_pages {
            let content = assembler.assemble(page, cursor);
            doc.add_page(Page::with_content(page, content));
        }

        Ok(doc)
    }

    fn image_pass(&self, path: &Path, cursor: &SectionCursor, doc: &mut Document) {
        let session = match self.backend.open_images(path) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Image pass skipped for {}: {}", path.display(), e);
                return;
            }
        };

        let added = ImageAnnotator::new(&session, cursor.context()).annotate(doc);
        log::debug!("Image pass added {} charts", added);
    }
}
