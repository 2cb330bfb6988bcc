//! Table detection using text position analysis.
//!
//! Detects tables by looking for rows whose spans start at X positions shared
//! with neighbouring rows, without relying on ruling lines. Two presets are
//! provided: a strict one used as the primary table source and a relaxed one
//! used by the stream fallback reader.

use std::collections::{HashMap, HashSet};

use super::layout::TextSpan;
use super::{HeaderedTable, RawCell, RawTable};

/// X positions within this many points share a column bucket.
const BUCKET_SIZE: f32 = 5.0;

/// Tolerance in points when checking a span against a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Y coordinate of the first row (PDF coords)
    pub top_y: f32,
    /// Y coordinate of the last row
    pub bottom_y: f32,
    /// Left X boundary
    pub left_x: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Column left edges
    pub columns: Vec<f32>,
    /// Rows of spans, top to bottom
    pub rows: Vec<TableRowData>,
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Average baseline of the row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl TableDetectorConfig {
    /// Preset for the primary table source.
    pub fn strict() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.5,
            min_column_gap: 15.0,
        }
    }

    /// Preset for the fallback stream reader.
    pub fn relaxed() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 12,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 8.0,
        }
    }
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self::strict()
    }
}

/// Detects tables in a list of text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a detector with the strict preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with a custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TableDetectorConfig {
        &self.config
    }

    /// Detect tables in the given spans, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        let min_spans = self.config.min_rows * self.config.min_columns;
        if spans.len() < min_spans {
            log::trace!(
                "TableDetector: not enough spans ({} < {})",
                spans.len(),
                min_spans
            );
            return Vec::new();
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        log::trace!(
            "TableDetector: {} rows, columns at {:?}",
            rows.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = rows[start..=end].to_vec();

            // Columns are re-detected for the region alone
            let table_columns = self.detect_columns(&table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::trace!(
                    "TableDetector: skipping region with {} columns (max {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if is_list_pattern(&table_rows, &table_columns) {
                log::trace!("TableDetector: skipping list-like region");
                continue;
            }

            tables.push(build_table(table_rows, table_columns));
        }

        tables
    }

    /// Group spans into rows by Y position.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(span);
                }
            }
        }

        if !current.is_empty() {
            rows.push(make_row(current));
        }

        rows
    }

    /// Detect column left edges from X positions repeated across rows.
    ///
    /// Rows with at least two spans are preferred; when too few exist every
    /// row votes instead.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi_span: Vec<&TableRowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let voters: Vec<&TableRowData> = if multi_span.len() >= self.config.min_rows {
            multi_span
        } else {
            rows.iter().collect()
        };
        if voters.is_empty() {
            return Vec::new();
        }

        // Each bucket counts once per row
        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &voters {
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.x / BUCKET_SIZE).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((voters.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * BUCKET_SIZE)
            .collect();
        edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find contiguous row ranges with good column alignment.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }

        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }
}

impl DetectedTable {
    /// Lay the spans out as a grid of cells, one per column.
    ///
    /// Spans landing in the same cell are joined with a space; cells that
    /// receive no span are `None`.
    pub fn to_grid(&self) -> RawTable {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
                for span in &row.spans {
                    let col = find_column_for_span(span.x, &self.columns, self.right_x);
                    if let Some(cell) = cells.get_mut(col) {
                        cell.push(span.text.trim());
                    }
                }
                cells
                    .into_iter()
                    .map(|parts| -> RawCell {
                        if parts.is_empty() {
                            None
                        } else {
                            Some(parts.join(" "))
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Split the grid into a header row and body rows.
    pub fn to_headered(&self) -> HeaderedTable {
        let mut grid = self.to_grid().into_iter();
        HeaderedTable {
            header: grid.next().unwrap_or_default(),
            rows: grid.collect(),
        }
    }
}

fn make_row(spans: Vec<TextSpan>) -> TableRowData {
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    TableRowData { y, spans }
}

fn build_table(rows: Vec<TableRowData>, columns: Vec<f32>) -> DetectedTable {
    let all_spans = || rows.iter().flat_map(|r| r.spans.iter());
    let left_x = all_spans().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let right_x = all_spans()
        .map(|s| s.x + s.width)
        .fold(f32::NEG_INFINITY, f32::max);

    DetectedTable {
        top_y: rows.first().map(|r| r.y).unwrap_or(0.0),
        bottom_y: rows.last().map(|r| r.y).unwrap_or(0.0),
        left_x,
        right_x,
        columns,
        rows,
    }
}

/// Share of a row's spans that start on a column edge.
fn alignment_score(row: &TableRowData, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }

    let aligned = row
        .spans
        .iter()
        .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= ALIGN_TOLERANCE))
        .count();

    aligned as f32 / row.spans.len() as f32
}

/// Column index for a span's left edge; spans may start up to 10pt early.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (span_x - **a).abs().total_cmp(&(span_x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if a region is really a numbered or bulleted list whose markers
/// were split into their own spans.
fn is_list_pattern(rows: &[TableRowData], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        let first = row.spans.iter().min_by(|a, b| a.x.total_cmp(&b.x));
        if let Some(span) = first {
            let text = span.text.trim();
            if is_bullet_marker(text) {
                bullets += 1;
            } else if is_number_marker(text) {
                numbers += 1;
            }
        }
    }

    let total = rows.len() as f32;
    if bullets as f32 / total >= 0.5 {
        return true;
    }

    // Numbered first columns are common in real tables; only two-column
    // regions are rejected
    columns.len() == 2 && (bullets + numbers) as f32 / total >= 0.5
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶"
    )
}

/// Numbered markers: `1.`, `12)`, a bare number, or a letter with `.`/`)`.
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}
