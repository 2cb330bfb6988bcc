//! Document-level types.

use super::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An extracted PDF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source and run information
    pub metadata: Metadata,

    /// Pages in source order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document with the given metadata and no pages.
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            pages: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_number: u32) -> Option<&Page> {
        if page_number == 0 {
            return None;
        }
        self.pages.get((page_number - 1) as usize)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of content items across all pages.
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.content.len()).sum()
    }
}

/// Metadata envelope written alongside the pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Input path as given by the caller
    pub source_file: String,

    /// Page count reported by the text session
    pub total_pages: u32,

    /// Wall-clock time at which extraction completed
    pub extraction_timestamp: DateTime<Utc>,
}

impl Metadata {
    /// Create metadata stamped with the current time.
    pub fn new(source_file: impl Into<String>, total_pages: u32) -> Self {
        Self {
            source_file: source_file.into(),
            total_pages,
            extraction_timestamp: Utc::now(),
        }
    }

    /// Re-stamp the extraction time to now.
    pub fn touch(&mut self) {
        self.extraction_timestamp = Utc::now();
    }
}
