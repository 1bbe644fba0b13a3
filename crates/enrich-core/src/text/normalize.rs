//! Turns article HTML into the plain text that is sent to a model.

use scraper::{ElementRef, Html, Node};

/// Elements whose contents are never article text.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that separate words when their markup is removed.
const BLOCK: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "table", "blockquote", "pre", "section", "article", "header", "footer", "figure",
    "figcaption", "hr", "dd", "dt",
];

/// Strips markup, decodes entities and collapses whitespace.
///
/// Block-level elements become a single space so adjacent paragraphs do not
/// run together; inline elements are removed without a gap. The parser
/// decodes every HTML5 character reference, and escaped markup (`&lt;b&gt;`)
/// survives as text.
pub fn normalize(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut text);
    compact_ws(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    out.push(' ');
                    continue;
                }
                let block = BLOCK.contains(&name);
                if block {
                    out.push(' ');
                }
                if let Some(nested) = ElementRef::wrap(child) {
                    collect_text(nested, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length in Unicode scalar values, the unit every length limit uses.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
