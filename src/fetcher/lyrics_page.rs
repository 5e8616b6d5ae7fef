//! Lyrics body extraction from a fetched lyrics page.

use ::scraper::{ElementRef, Html, Node, Selector};

const CONTAINER_SELECTOR: &str = "div[data-lyrics-container=\"true\"]";
const LEGACY_SELECTOR: &str = "div.lyrics";
const EXCLUDED_ATTR: &str = "data-exclude-from-selection";

/// Extract the lyrics text from a lyrics page, `None` if nothing was found.
///
/// Current pages split the lyrics over several containers with `<br>` line
/// breaks; older pages use a single `div.lyrics`.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let containers = Selector::parse(CONTAINER_SELECTOR).ok()?;
    let mut lyrics = String::new();
    for container in document.select(&containers) {
        collect_text(container, &mut lyrics);
        lyrics.push('\n');
    }

    if lyrics.trim().is_empty() {
        let legacy = Selector::parse(LEGACY_SELECTOR).ok()?;
        if let Some(element) = document.select(&legacy).next() {
            collect_text(element, &mut lyrics);
        }
    }

    let lyrics = lyrics.trim();
    (!lyrics.is_empty()).then(|| lyrics.to_string())
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) if el.attr(EXCLUDED_ATTR) == Some("true") => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}
