//! Cell content produced for each table cell.

use buildscope_core::{escape_html, Column, ProblemCategory, Row};
use serde::{Deserialize, Serialize};

/// Displayable content of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellContent {
    /// Plain text
    Text {
        /// Text
        text: String,
    },
    /// Text with a CSS class
    Styled {
        /// CSS class
        class: String,
        /// Text
        text: String,
    },
    /// Hyperlink opening in a new tab
    Link {
        /// Target URL
        href: String,
        /// Link text
        text: String,
        /// CSS class
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<String>,
    },
    /// De-emphasized zero
    ZeroMarker,
}

impl CellContent {
    /// Plain text content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Styled text content.
    #[must_use]
    pub fn styled(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Styled {
            class: class.into(),
            text: text.into(),
        }
    }

    /// Link content.
    #[must_use]
    pub fn link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Link {
            href: href.into(),
            text: text.into(),
            class: None,
        }
    }

    /// Link content with a CSS class.
    #[must_use]
    pub fn link_with_class(
        href: impl Into<String>,
        text: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self::Link {
            href: href.into(),
            text: text.into(),
            class: Some(class.into()),
        }
    }

    /// Visible text of the cell.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Text { text } | Self::Styled { text, .. } | Self::Link { text, .. } => text,
            Self::ZeroMarker => "0",
        }
    }

    /// Check whether the cell is a link.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. })
    }

    /// Render as HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Text { text } => escape_html(text),
            Self::Styled { class, text } => format!(
                r#"<span class="{}">{}</span>"#,
                escape_html(class),
                escape_html(text)
            ),
            Self::Link { href, text, class } => {
                let class_attr = class
                    .as_ref()
                    .map(|c| format!(r#" class="{}""#, escape_html(c)))
                    .unwrap_or_default();
                format!(
                    r#"<a href="{}" target="_blank"{class_attr}>{}</a>"#,
                    escape_html(href),
                    escape_html(text)
                )
            }
            Self::ZeroMarker => r#"<span class="zero-value">0</span>"#.to_string(),
        }
    }
}

/// Produces the content of body cells.
///
/// The renderer handles zero counts and problem links itself; everything else
/// is delegated to [`CellRenderer::render_cell`]. Links are always built by
/// the implementor, never by the renderer.
pub trait CellRenderer {
    /// Content for a cell, given its column, formatted value and row.
    fn render_cell(&self, column: &Column, formatted: &str, row: &Row) -> CellContent;

    /// Link target for a non-zero problem count. `None` renders plain text.
    fn problem_href(&self, _row: &Row, _category: ProblemCategory) -> Option<String> {
        None
    }
}

impl<F> CellRenderer for F
where
    F: Fn(&Column, &str, &Row) -> CellContent,
{
    fn render_cell(&self, column: &Column, formatted: &str, row: &Row) -> CellContent {
        self(column, formatted, row)
    }
}

/// Cell renderer that shows the formatted value as text.
#[must_use]
pub fn plain(_column: &Column, formatted: &str, _row: &Row) -> CellContent {
    CellContent::text(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_html_is_escaped() {
        assert_eq!(CellContent::text("a<b").to_html(), "a&lt;b");
    }

    #[test]
    fn test_link_html() {
        let link = CellContent::link_with_class("x?a=1&b=2", "3", "failure problems");
        assert_eq!(
            link.to_html(),
            r#"<a href="x?a=1&amp;b=2" target="_blank" class="failure problems">3</a>"#
        );
        assert!(link.is_link());
        assert_eq!(link.label(), "3");
    }

    #[test]
    fn test_zero_marker() {
        assert_eq!(
            CellContent::ZeroMarker.to_html(),
            r#"<span class="zero-value">0</span>"#
        );
        assert!(!CellContent::ZeroMarker.is_link());
    }

    #[test]
    fn test_closure_renderer() {
        let renderer = |_c: &Column, f: &str, _r: &Row| CellContent::styled("x", f);
        let content = renderer.render_cell(&Column::new("a", "A"), "v", &Row::root("r"));
        assert_eq!(content, CellContent::styled("x", "v"));
        assert!(renderer
            .problem_href(&Row::root("r"), ProblemCategory::Failure)
            .is_none());
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&CellContent::ZeroMarker).unwrap();
        assert_eq!(json, r#"{"type":"zero_marker"}"#);
    }
}
