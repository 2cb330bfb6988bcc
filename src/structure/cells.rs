//! Table cell normalization, applied uniformly to every table source.

use crate::backend::{RawCell, RawTable};

/// Normalize one raw cell: missing becomes the empty string, anything else
/// has every whitespace run collapsed to a single space and its ends trimmed.
pub fn normalize_cell(cell: Option<&str>) -> String {
    match cell {
        None => String::new(),
        Some(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Normalize every cell of a raw table, preserving row and column order.
pub fn clean_table(table: &RawTable) -> Vec<Vec<String>> {
    table
        .iter()
        .map(|row| row.iter().map(|c: &RawCell| normalize_cell(c.as_deref())).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_missing_cell() {
        assert_eq!(normalize_cell(None), "");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_cell(Some("  Net \n income\t(USD) ")), "Net income (USD)");
        assert_eq!(normalize_cell(Some("\u{a0}x\u{a0}")), "x");
        assert_eq!(normalize_cell(Some("   ")), "");
    }

    #[test]
    fn test_clean_table_keeps_shape() {
        let raw: RawTable = vec![
            vec![Some("Name".into()), Some("Age".into())],
            vec![Some(" Alice ".into()), None],
            vec![Some("Bob\nSmith".into()), Some("25".into())],
        ];

        let cleaned = clean_table(&raw);
        assert_eq!(
            cleaned,
            vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), String::new()],
                vec!["Bob Smith".to_string(), "25".to_string()],
            ]
        );
    }
}
