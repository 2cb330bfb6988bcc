//! The section cursor.
//!
//! One cursor lives for a whole extraction run. It is threaded by reference
//! through every page of the text pass and is never reset between pages, so
//! a section seen on page 3 stays current on page 4 until another heading
//! replaces it. The image pass runs afterwards and reads the cursor as the
//! text pass left it.

use crate::model::SectionContext;

use super::heading::{Heading, HeadingLevel};

/// Mutable `(current_section, current_subsection)` state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionCursor {
    section: Option<String>,
    sub_section: Option<String>,
}

impl SectionCursor {
    /// Create a cursor with no active section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a classified heading into the cursor.
    ///
    /// A section replaces the current section and clears the subsection; a
    /// subsection replaces only the subsection.
    pub fn observe(&mut self, heading: &Heading) {
        match heading.level {
            HeadingLevel::Section => {
                self.section = Some(heading.title.clone());
                self.sub_section = None;
            }
            HeadingLevel::Subsection => {
                self.sub_section = Some(heading.title.clone());
            }
        }
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn sub_section(&self) -> Option<&str> {
        self.sub_section.as_deref()
    }

    /// Snapshot of the current pair, used to tag a newly created item.
    pub fn context(&self) -> SectionContext {
        SectionContext {
            section: self.section.clone(),
            sub_section: self.sub_section.clone(),
        }
    }
}
