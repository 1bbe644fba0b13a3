//! Markdown to HTML rendering behind an injectable renderer.

/// Error from markdown rendering.
#[derive(Debug, Clone)]
pub struct MarkdownError(pub String);

impl std::fmt::Display for MarkdownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MarkdownError {}

/// Renderer abstraction: convert markdown to HTML.
pub trait MarkdownToHtml: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String, MarkdownError>;
}

/// Default implementation using pulldown-cmark.
pub struct PulldownMarkdownRenderer;

impl MarkdownToHtml for PulldownMarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, MarkdownError> {
        use pulldown_cmark::{Options, Parser, html};
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let mut out = String::new();
        html::push_html(&mut out, Parser::new_ext(markdown, options));
        Ok(out)
    }
}

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped text with line breaks turned into `<br>`.
pub(crate) fn plain_text_html(text: &str) -> String {
    escape_html(text)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br>")
}
