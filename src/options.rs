//! Extraction options.

/// Options for an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Consult fallback table readers for pages where the primary source
    /// finds no tables
    pub fallback_tables: bool,

    /// Run the image pass and emit chart items
    pub extract_images: bool,
}

impl ExtractOptions {
    /// Create options with everything enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable fallback table readers.
    pub fn with_fallback_tables(mut self, enabled: bool) -> Self {
        self.fallback_tables = enabled;
        self
    }

    /// Enable or disable the image pass.
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.extract_images = enabled;
        self
    }

    /// Text and tables only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fallback_tables: true,
            extract_images: true,
        }
    }
}
