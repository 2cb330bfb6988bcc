//! JSON rendering and persistence.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with 2-space indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON. Non-ASCII text is written as is.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Write a document to `path`.
///
/// The JSON is rendered in full before the destination is touched, written
/// to a temporary file next to it and renamed into place, so a failed write
/// leaves any previous file intact and never a partial one.
pub fn write_json<P: AsRef<Path>>(doc: &Document, path: P, format: JsonFormat) -> Result<()> {
    let path = path.as_ref();
    persist(doc, path, format).map_err(|source| {
        log::error!("Error saving JSON file {}: {}", path.display(), source);
        Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

fn persist(doc: &Document, path: &Path, format: JsonFormat) -> io::Result<()> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_vec_pretty(doc)?,
        JsonFormat::Compact => serde_json::to_vec(doc)?,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentItem, Metadata, Page, SectionContext};

    fn sample() -> Document {
        let mut doc = Document::new(Metadata::new("résumé.pdf", 1));
        doc.add_page(Page::with_content(
            1,
            vec![ContentItem::paragraph(
                SectionContext::new(Some("Überblick"), None),
                "Grüße aus Köln",
            )],
        ));
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\n  \"metadata\": {"));
        assert!(json.contains("Grüße aus Köln"));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains(r#""type":"paragraph""#));
    }

    #[test]
    fn test_write_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let doc = sample();

        write_json(&doc, &path, JsonFormat::Pretty).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Document = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_write_json_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");

        let err = write_json(&sample(), &path, JsonFormat::Pretty).unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
        assert!(!path.exists());
    }
}
