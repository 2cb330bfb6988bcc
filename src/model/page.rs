//! Page-level types.

use super::ContentItem;
use serde::{Deserialize, Serialize};

/// A single page of extracted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Content items in reconstructed reading order
    pub content: Vec<ContentItem>,
}

impl Page {
    /// Create an empty page.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            content: Vec::new(),
        }
    }

    /// Create a page with its assembled content.
    pub fn with_content(page_number: u32, content: Vec<ContentItem>) -> Self {
        Self {
            page_number,
            content,
        }
    }

    /// Append an item after everything already on the page.
    pub fn push(&mut self, item: ContentItem) {
        self.content.push(item);
    }

    /// Check if the page carries no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of paragraph items.
    pub fn paragraph_count(&self) -> usize {
        self.content.iter().filter(|i| i.is_paragraph()).count()
    }

    /// Number of table items.
    pub fn table_count(&self) -> usize {
        self.content.iter().filter(|i| i.is_table()).count()
    }

    /// Number of chart items.
    pub fn chart_count(&self) -> usize {
        self.content.iter().filter(|i| i.is_chart()).count()
    }
}
