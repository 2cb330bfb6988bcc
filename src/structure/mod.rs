//! Structure recovery over collaborator output.
//!
//! Page text is flattened by the time it reaches this layer, so headings are
//! recognized by pattern alone and folded into a [`SectionCursor`] that tags
//! every item created after them.

mod annotator;
mod assembler;
mod cells;
mod heading;
mod section;

pub use annotator::ImageAnnotator;
pub use assembler::PageAssembler;
pub use cells::{clean_table, normalize_cell};
pub use heading::{classify, Heading, HeadingLevel};
pub use section::SectionCursor;
