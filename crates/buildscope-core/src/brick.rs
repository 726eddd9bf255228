//! HTML output contract for renderable components.

/// A component that renders to deterministic HTML and CSS.
pub trait Brick {
    /// Get the brick's unique type name
    fn brick_name(&self) -> &'static str;

    /// Generate HTML for this brick.
    ///
    /// Must be deterministic (same state -> same output).
    fn to_html(&self) -> String;

    /// Generate CSS for this brick, scoped by class name.
    fn to_css(&self) -> String;

    /// Get the test ID for DOM queries
    fn test_id(&self) -> Option<&str> {
        None
    }
}

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label(&'static str);

    impl Brick for Label {
        fn brick_name(&self) -> &'static str {
            "Label"
        }

        fn to_html(&self) -> String {
            format!("<span>{}</span>", escape_html(self.0))
        }

        fn to_css(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">T&C's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;T&amp;C&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_default_test_id() {
        let label = Label("a<b");
        assert_eq!(label.to_html(), "<span>a&lt;b</span>");
        assert!(label.test_id().is_none());
        assert_eq!(label.brick_name(), "Label");
    }
}
