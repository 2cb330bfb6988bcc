//! Per-page content assembly.
//!
//! Tables are collected first, then the page text is scanned line by line
//! into paragraphs while headings update the section cursor. Both streams
//! carry a transient position key and are merged with a stable sort, so at
//! equal keys tables come before paragraphs.

use std::path::Path;

use crate::backend::{RawTable, TableReader, TextSession};
use crate::model::ContentItem;

use super::cells::clean_table;
use super::heading::classify;
use super::section::SectionCursor;

/// Position key for tables from a fallback reader, which carry no geometry.
const FALLBACK_TABLE_POSITION: f32 = 300.0;

/// A content item with its sort key, discarded after the merge.
#[derive(Debug)]
struct Positioned {
    key: f32,
    item: ContentItem,
}

/// Builds the content list of one page at a time from an open text session.
pub struct PageAssembler<'a, S: TextSession> {
    session: &'a S,
    path: &'a Path,
    readers: &'a [Box<dyn TableReader>],
}

impl<'a, S: TextSession> PageAssembler<'a, S> {
    /// Create an assembler without fallback table readers.
    pub fn new(session: &'a S, path: &'a Path) -> Self {
        Self {
            session,
            path,
            readers: &[],
        }
    }

    /// Consult these readers, in order, for pages where the session finds
    /// no tables.
    pub fn with_readers(mut self, readers: &'a [Box<dyn TableReader>]) -> Self {
        self.readers = readers;
        self
    }

    /// Assemble one page (1-based), advancing the cursor over its headings.
    pub fn assemble(&self, page: u32, cursor: &mut SectionCursor) -> Vec<ContentItem> {
        let mut positioned = self.collect_tables(page, cursor);
        let table_count = positioned.len();
        positioned.extend(self.collect_paragraphs(page, cursor));

        log::debug!(
            "Page {}: {} tables, {} paragraphs",
            page,
            table_count,
            positioned.len() - table_count
        );

        positioned.sort_by(|a, b| a.key.total_cmp(&b.key));
        positioned.into_iter().map(|p| p.item).collect()
    }

    fn collect_tables(&self, page: u32, cursor: &SectionCursor) -> Vec<Positioned> {
        let raw_tables = match self.session.page_tables(page) {
            Ok(tables) => tables,
            Err(e) => {
                log::warn!("Table extraction failed on page {}: {}", page, e);
                Vec::new()
            }
        };

        let mut tables = Vec::new();
        if !raw_tables.is_empty() {
            let height = match self.session.page_height(page) {
                Ok(h) => Some(h),
                Err(e) => {
                    log::warn!("Could not read height of page {}: {}", page, e);
                    None
                }
            };

            for (i, raw) in raw_tables.iter().enumerate() {
                if !has_body(raw) {
                    continue;
                }
                let description = format!("Table {} from page {}", i + 1, page);
                log::debug!("{} ({} rows)", description, raw.len());
                tables.push(Positioned {
                    key: height.map_or(FALLBACK_TABLE_POSITION, |h| (i + 1) as f32 * (h / 4.0)),
                    item: ContentItem::table(cursor.context(), description, clean_table(raw)),
                });
            }
        }

        if tables.is_empty() {
            tables = self.fallback_tables(page, cursor);
        }
        tables
    }

    /// Try each fallback reader until one yields a usable table.
    fn fallback_tables(&self, page: u32, cursor: &SectionCursor) -> Vec<Positioned> {
        for reader in self.readers {
            let found = match reader.read_tables(self.path, page) {
                Ok(found) => found,
                Err(e) => {
                    log::debug!("{} reader failed on page {}: {}", reader.name(), page, e);
                    continue;
                }
            };

            let tables: Vec<Positioned> = found
                .into_iter()
                .map(|t| t.into_grid())
                .enumerate()
                .filter(|(_, grid)| has_body(grid))
                .map(|(i, grid)| {
                    let description =
                        format!("Table {} from page {} ({})", i + 1, page, reader.name());
                    log::debug!("{} ({} rows)", description, grid.len());
                    Positioned {
                        key: FALLBACK_TABLE_POSITION,
                        item: ContentItem::table(cursor.context(), description, clean_table(&grid)),
                    }
                })
                .collect();

            if !tables.is_empty() {
                return tables;
            }
        }
        Vec::new()
    }

    fn collect_paragraphs(&self, page: u32, cursor: &mut SectionCursor) -> Vec<Positioned> {
        let text = match self.session.page_text(page) {
            Ok(Some(text)) => text,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Text extraction failed on page {}: {}", page, e);
                return Vec::new();
            }
        };

        let mut paragraphs = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut line_count = 0;

        for (index, line) in text.split('\n').enumerate() {
            line_count = index + 1;
            let line = line.trim();

            if line.is_empty() {
                flush(&mut buffer, index as f32, cursor, &mut paragraphs);
                continue;
            }

            if let Some(heading) = classify(line) {
                flush(&mut buffer, index as f32, cursor, &mut paragraphs);
                log::debug!("Page {}: {:?} heading {:?}", page, heading.level, heading.title);
                cursor.observe(&heading);
                continue;
            }

            buffer.push(line);
        }

        flush(&mut buffer, line_count as f32, cursor, &mut paragraphs);
        paragraphs
    }
}

/// Emit the buffered lines as one paragraph and clear the buffer.
fn flush(buffer: &mut Vec<&str>, key: f32, cursor: &SectionCursor, out: &mut Vec<Positioned>) {
    if buffer.is_empty() {
        return;
    }

    let text = buffer
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    buffer.clear();

    if !text.is_empty() {
        out.push(Positioned {
            key,
            item: ContentItem::paragraph(cursor.context(), text),
        });
    }
}

/// A table is kept only when it has more than one row.
fn has_body(table: &RawTable) -> bool {
    table.len() > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeaderedTable;
    use crate::error::{Error, Result};
    use crate::model::SectionContext;

    #[derive(Default)]
    struct FakeSession {
        text: Option<String>,
        tables: Vec<RawTable>,
        fail_tables: bool,
        fail_text: bool,
        fail_height: bool,
    }

    impl TextSession for FakeSession {
        fn page_count(&self) -> u32 {
            1
        }

        fn page_height(&self, page: u32) -> Result<f32> {
            if self.fail_height {
                return Err(Error::PageOutOfRange(page, 0));
            }
            Ok(800.0)
        }

        fn page_text(&self, _page: u32) -> Result<Option<String>> {
            if self.fail_text {
                return Err(Error::TextExtract("boom".into()));
            }
            Ok(self.text.clone())
        }

        fn page_tables(&self, _page: u32) -> Result<Vec<RawTable>> {
            if self.fail_tables {
                return Err(Error::TableExtract("boom".into()));
            }
            Ok(self.tables.clone())
        }
    }

    struct FixedReader(&'static str, Vec<HeaderedTable>);

    impl TableReader for FixedReader {
        fn name(&self) -> &str {
            self.0
        }

        fn read_tables(&self, _path: &Path, _page: u32) -> Result<Vec<HeaderedTable>> {
            Ok(self.1.clone())
        }
    }

    struct FailingReader;

    impl TableReader for FailingReader {
        fn name(&self) -> &str {
            "failing"
        }

        fn read_tables(&self, _path: &Path, _page: u32) -> Result<Vec<HeaderedTable>> {
            Err(Error::TableExtract("unreadable".into()))
        }
    }

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn text_session(text: &str) -> FakeSession {
        FakeSession {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn paragraph_texts(items: &[ContentItem]) -> Vec<&str> {
        items
            .iter()
            .filter_map(|i| match i {
                ContentItem::Paragraph(p) => Some(p.text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_heading_folds_into_cursor() {
        let session = text_session("INTRODUCTION\n\nThis is a test paragraph.\n");
        let mut cursor = SectionCursor::new();

        let items = PageAssembler::new(&session, Path::new("x.pdf")).assemble(1, &mut cursor);

        assert_eq!(
            items,
            vec![ContentItem::paragraph(
                SectionContext::new(Some("INTRODUCTION"), None),
                "This is a test paragraph."
            )]
        );
        assert_eq!(cursor.section(), Some("INTRODUCTION"));
    }

    #[test]
    fn test_multiline_paragraph_is_joined() {
        let session = text_session("the first line\n  and   the second\n\nanother one");
        let items =
            PageAssembler::new(&session, Path::new("x.pdf")).assemble(1, &mut SectionCursor::new());

        assert_eq!(
            paragraph_texts(&items),
            vec!["the first line and the second", "another one"]
        );
    }

    #[test]
    fn test_subsection_keeps_section() {
        let session = text_session("RESULTS\nsome text\n1.1 Setup\nmore text");
        let mut cursor = SectionCursor::new();
        let items = PageAssembler::new(&session, Path::new("x.pdf")).assemble(1, &mut cursor);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].context(), SectionContext::new(Some("RESULTS"), None));
        assert_eq!(
            items[1].context(),
            SectionContext::new(Some("RESULTS"), Some("Setup"))
        );
    }

    #[test]
    fn test_table_keeps_pre_scan_context() {
        let session = FakeSession {
            text: Some("METHODS\nbody text here.".into()),
            tables: vec![vec![vec![cell("a"), cell("b")], vec![cell("1"), None]]],
            ..Default::default()
        };
        let mut cursor = SectionCursor::new();
        cursor.observe(&crate::structure::Heading::section("Background"));

        let items = PageAssembler::new(&session, Path::new("x.pdf")).assemble(1, &mut cursor);

        // Paragraph at line 2 sorts before the table at 800/4
        assert!(items[0].is_paragraph());
        assert_eq!(items[0].section(), Some("METHODS"));
        assert!(items[1].is_table());
        assert_eq!(items[1].section(), Some("Background"));
        match &items[1] {
            ContentItem::Table(t) => {
                assert_eq!(t.description, "Table 1 from page 1");
                assert_eq!(t.table_data, vec![vec!["a", "b"], vec!["1", ""]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_single_row_tables_dropped_and_indices_kept() {
        let session = FakeSession {
            tables: vec![
                vec![vec![cell("header only")]],
                vec![vec![cell("x")], vec![cell("y")]],
            ],
            ..Default::default()
        };
        let items =
            PageAssembler::new(&session, Path::new("x.pdf")).assemble(3, &mut SectionCursor::new());

        assert_eq!(items.len(), 1);
        match &items[0] {
            ContentItem::Table(t) => assert_eq!(t.description, "Table 2 from page 3"),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_used_when_primary_empty() {
        let session = FakeSession::default();
        let readers: Vec<Box<dyn TableReader>> = vec![
            Box::new(FailingReader),
            Box::new(FixedReader("empty", vec![])),
            Box::new(FixedReader(
                "stream",
                vec![HeaderedTable {
                    header: vec![cell("Item"), cell("Qty")],
                    rows: vec![vec![cell(" Bolt "), cell("4")]],
                }],
            )),
            Box::new(FixedReader(
                "never",
                vec![HeaderedTable {
                    header: vec![cell("z")],
                    rows: vec![vec![cell("z")]],
                }],
            )),
        ];

        let items = PageAssembler::new(&session, Path::new("x.pdf"))
            .with_readers(&readers)
            .assemble(2, &mut SectionCursor::new());

        assert_eq!(items.len(), 1);
        match &items[0] {
            ContentItem::Table(t) => {
                assert_eq!(t.description, "Table 1 from page 2 (stream)");
                assert_eq!(t.table_data, vec![vec!["Item", "Qty"], vec!["Bolt", "4"]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_skipped_when_primary_has_tables() {
        let session = FakeSession {
            tables: vec![vec![vec![cell("a")], vec![cell("b")]]],
            ..Default::default()
        };
        let readers: Vec<Box<dyn TableReader>> = vec![Box::new(FixedReader(
            "stream",
            vec![HeaderedTable {
                header: vec![cell("h")],
                rows: vec![vec![cell("r")]],
            }],
        ))];

        let items = PageAssembler::new(&session, Path::new("x.pdf"))
            .with_readers(&readers)
            .assemble(1, &mut SectionCursor::new());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), "table");
        assert!(matches!(&items[0], ContentItem::Table(t) if !t.description.contains("stream")));
    }

    #[test]
    fn test_collaborator_failures_downgrade_to_empty() {
        let session = FakeSession {
            fail_tables: true,
            fail_text: true,
            ..Default::default()
        };
        let items =
            PageAssembler::new(&session, Path::new("x.pdf")).assemble(1, &mut SectionCursor::new());
        assert!(items.is_empty());
    }

    #[test]
    fn test_table_keys_follow_page_height() {
        let table = vec![vec![cell("a")], vec![cell("b")]];
        let mut session = FakeSession {
            tables: vec![table.clone(), table],
            ..Default::default()
        };
        let assembler = PageAssembler::new(&session, Path::new("x.pdf"));
        let keys: Vec<f32> = assembler
            .collect_tables(1, &SectionCursor::new())
            .iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec![200.0, 400.0]);

        session.fail_height = true;
        let assembler = PageAssembler::new(&session, Path::new("x.pdf"));
        let keys: Vec<f32> = assembler
            .collect_tables(1, &SectionCursor::new())
            .iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec![FALLBACK_TABLE_POSITION, FALLBACK_TABLE_POSITION]);
    }

    #[test]
    fn test_tables_precede_paragraphs_at_equal_key() {
        // Three lines, the paragraph flushes at the end-of-page key 3; with a
        // page height of 12 the first table key is 3 as well.
        struct ShortPage;
        impl TextSession for ShortPage {
            fn page_count(&self) -> u32 {
                1
            }
            fn page_height(&self, _page: u32) -> Result<f32> {
                Ok(12.0)
            }
            fn page_text(&self, _page: u32) -> Result<Option<String>> {
                Ok(Some("one.\ntwo.\nthree.".into()))
            }
            fn page_tables(&self, _page: u32) -> Result<Vec<RawTable>> {
                Ok(vec![vec![vec![Some("a".into())], vec![Some("b".into())]]])
            }
        }

        let items = PageAssembler::new(&ShortPage, Path::new("x.pdf"))
            .assemble(1, &mut SectionCursor::new());
        assert_eq!(items.len(), 2);
        assert!(items[0].is_table());
        assert!(items[1].is_paragraph());
    }
}
