//! Content item types.

use serde::{Deserialize, Serialize};

/// The `(section, sub_section)` pair attached to every content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    /// Active top-level section title
    pub section: Option<String>,
    /// Active subsection title
    pub sub_section: Option<String>,
}

impl SectionContext {
    /// Create a context from explicit titles.
    pub fn new(section: Option<&str>, sub_section: Option<&str>) -> Self {
        Self {
            section: section.map(String::from),
            sub_section: sub_section.map(String::from),
        }
    }
}

/// One unit of page output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// A run of body text
    Paragraph(ParagraphItem),
    /// A table with stringified cells
    Table(TableItem),
    /// An embedded image, recorded as metadata only
    Chart(ChartItem),
}

/// Paragraph payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphItem {
    pub section: Option<String>,
    pub sub_section: Option<String>,
    /// Joined, whitespace-collapsed text
    pub text: String,
}

/// Table payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableItem {
    pub section: Option<String>,
    pub sub_section: Option<String>,
    pub description: String,
    /// Rows of normalized cells; always more than one row
    pub table_data: Vec<Vec<String>>,
}

/// Chart payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartItem {
    pub section: Option<String>,
    pub sub_section: Option<String>,
    pub description: String,
    pub image_info: ImageInfo,
    /// Chart content is never decoded; always `None`, written as `null`.
    pub table_data: Option<Vec<Vec<String>>>,
}

/// Image metadata recorded for a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// File extension of the extracted payload (e.g. `jpeg`, `png`)
    pub format: String,
    /// Length in bytes of the extracted payload
    pub byte_size: usize,
}

impl ContentItem {
    /// Create a paragraph item.
    pub fn paragraph(context: SectionContext, text: impl Into<String>) -> Self {
        ContentItem::Paragraph(ParagraphItem {
            section: context.section,
            sub_section: context.sub_section,
            text: text.into(),
        })
    }

    /// Create a table item.
    pub fn table(
        context: SectionContext,
        description: impl Into<String>,
        table_data: Vec<Vec<String>>,
    ) -> Self {
        ContentItem::Table(TableItem {
            section: context.section,
            sub_section: context.sub_section,
            description: description.into(),
            table_data,
        })
    }

    /// Create a chart item.
    pub fn chart(context: SectionContext, description: impl Into<String>, info: ImageInfo) -> Self {
        ContentItem::Chart(ChartItem {
            section: context.section,
            sub_section: context.sub_section,
            description: description.into(),
            image_info: info,
            table_data: None,
        })
    }

    /// The `type` tag as written to JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentItem::Paragraph(_) => "paragraph",
            ContentItem::Table(_) => "table",
            ContentItem::Chart(_) => "chart",
        }
    }

    /// Section title this item was tagged with.
    pub fn section(&self) -> Option<&str> {
        match self {
            ContentItem::Paragraph(p) => p.section.as_deref(),
            ContentItem::Table(t) => t.section.as_deref(),
            ContentItem::Chart(c) => c.section.as_deref(),
        }
    }

    /// Subsection title this item was tagged with.
    pub fn sub_section(&self) -> Option<&str> {
        match self {
            ContentItem::Paragraph(p) => p.sub_section.as_deref(),
            ContentItem::Table(t) => t.sub_section.as_deref(),
            ContentItem::Chart(c) => c.sub_section.as_deref(),
        }
    }

    /// Both tags as a context value.
    pub fn context(&self) -> SectionContext {
        SectionContext::new(self.section(), self.sub_section())
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, ContentItem::Paragraph(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, ContentItem::Table(_))
    }

    pub fn is_chart(&self) -> bool {
        matches!(self, ContentItem::Chart(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paragraph_json_shape() {
        let item = ContentItem::paragraph(
            SectionContext::new(Some("INTRODUCTION"), None),
            "This is a test paragraph.",
        );

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "paragraph",
                "section": "INTRODUCTION",
                "sub_section": null,
                "text": "This is a test paragraph."
            })
        );
    }

    #[test]
    fn test_type_tag_is_first_key() {
        let item = ContentItem::table(
            SectionContext::default(),
            "Table 1 from page 1",
            vec![vec!["a".into()], vec!["b".into()]],
        );
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.starts_with(r#"{"type":"table","section":null"#));
    }

    #[test]
    fn test_chart_writes_null_table_data() {
        let item = ContentItem::chart(
            SectionContext::default(),
            "Image/Chart 1 from page 2",
            ImageInfo {
                width: 640,
                height: 480,
                format: "png".into(),
                byte_size: 1024,
            },
        );

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "chart");
        assert!(value["table_data"].is_null());
        assert_eq!(value["image_info"]["format"], "png");
        assert_eq!(value["image_info"]["byte_size"], 1024);
    }

    #[test]
    fn test_accessors() {
        let item = ContentItem::paragraph(SectionContext::new(Some("A"), Some("B")), "x");
        assert_eq!(item.kind(), "paragraph");
        assert_eq!(item.section(), Some("A"));
        assert_eq!(item.sub_section(), Some("B"));
        assert!(item.is_paragraph());
        assert!(!item.is_chart());
    }

    #[test]
    fn test_deserialize_tagged_item() {
        let item: ContentItem = serde_json::from_value(json!({
            "type": "chart",
            "section": "Results",
            "sub_section": "Figures",
            "description": "Image/Chart 1 from page 3",
            "image_info": {"width": 1, "height": 2, "format": "jpeg", "byte_size": 3},
            "table_data": null
        }))
        .unwrap();

        assert!(item.is_chart());
        assert_eq!(item.context(), SectionContext::new(Some("Results"), Some("Figures")));
    }
}
