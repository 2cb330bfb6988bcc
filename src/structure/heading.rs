//! Heading classification.
//!
//! Flattened PDF text carries no heading tags, so headings are recognised
//! from common typographic conventions with an ordered list of patterns.
//! Section patterns are tried before subsection patterns and the first
//! match wins. There is no confidence scoring; false positives such as a
//! short capitalised sentence without punctuation are accepted.

use once_cell::sync::Lazy;
use regex::Regex;

/// Level of a recognised heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// A top-level section
    Section,
    /// A subsection of the current section
    Subsection,
}

/// A heading line with its extracted title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: HeadingLevel,
    /// Title text, trimmed
    pub title: String,
}

impl Heading {
    pub fn section(title: impl Into<String>) -> Self {
        Self {
            level: HeadingLevel::Section,
            title: title.into(),
        }
    }

    pub fn subsection(title: impl Into<String>) -> Self {
        Self {
            level: HeadingLevel::Subsection,
            title: title.into(),
        }
    }
}

static SECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // Title case or sentence case: "Introduction", "Related work"
        r"^\s*([A-Z][A-Za-z\s]+)\s*$",
        // Numbered: "1. Introduction"
        r"^\s*\d+\.\s+([A-Za-z][A-Za-z\s]+)\s*$",
        // All caps: "RESULTS AND DISCUSSION"
        r"^\s*([A-Z]+[A-Z\s]*[A-Z]+)\s*$",
        // "Chapter 3: Methods"
        r"^\s*Chapter\s+\d+[:.]?\s*([A-Za-z][A-Za-z\s]+)\s*$",
    ])
});

static SUBSECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // "1.1 Background", "2.3. Data"
        r"^\s*\d+\.\d+\.?\s+([A-Za-z][A-Za-z\s]+)\s*$",
        // "a) Setup"
        r"^\s*[a-z]\)\s+([A-Za-z][A-Za-z\s]+)\s*$",
        // "A) Setup"
        r"^\s*[A-Z]\)\s+([A-Za-z][A-Za-z\s]+)\s*$",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
}

/// Classify a line of text as a section heading, a subsection heading, or
/// neither.
pub fn classify(line: &str) -> Option<Heading> {
    if let Some(title) = first_match(&SECTION_PATTERNS, line) {
        return Some(Heading::section(title));
    }
    first_match(&SUBSECTION_PATTERNS, line).map(Heading::subsection)
}

fn first_match(patterns: &[Regex], line: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}
