use std::collections::BTreeSet;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::markdown::markdown_options;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub title: String,
    pub src: String,
}

/// Links, headings and images of a markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Elements {
    /// Link destinations, deduplicated and sorted.
    pub links: BTreeSet<String>,
    /// Headings in document order.
    pub headings: Vec<Heading>,
    /// Images in document order.
    pub images: Vec<Image>,
}

impl Elements {
    pub fn links(&self) -> Vec<&str> {
        self.links.iter().map(String::as_str).collect()
    }
}

enum Capture {
    Heading(u32),
    Image(String),
}

/// Collect headings, links and images in a single pass over the document.
///
/// Heading and image titles are flattened to plain text; inline formatting
/// is dropped.
pub fn extract_elements(markdown: &str) -> Elements {
    let mut elements = Elements::default();
    let mut open: Vec<(Capture, String)> = Vec::new();

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                open.push((Capture::Heading(level as u32), String::new()));
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                open.push((Capture::Image(dest_url.to_string()), String::new()));
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                elements.links.insert(dest_url.to_string());
            }
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Image) => {
                let Some((capture, text)) = open.pop() else {
                    continue;
                };
                match capture {
                    Capture::Heading(level) => elements.headings.push(Heading { level, text }),
                    Capture::Image(src) => elements.images.push(Image { title: text, src }),
                }
            }
            Event::Text(text) | Event::Code(text) => {
                for (_, buffer) in open.iter_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                for (_, buffer) in open.iter_mut() {
                    buffer.push(' ');
                }
            }
            _ => {}
        }
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_headings_in_order() {
        let elements = extract_elements("# One\n\ntext\n\n## Two *emph* `code`\n\n# Three\n");
        assert_eq!(
            elements.headings,
            vec![
                Heading { level: 1, text: "One".into() },
                Heading { level: 2, text: "Two emph code".into() },
                Heading { level: 1, text: "Three".into() },
            ]
        );
    }

    #[test]
    fn links_are_sorted_and_deduplicated() {
        let elements = extract_elements(
            "[b](https://b.org) [a](#anchor) [again](https://b.org)\n\n[c](c.md)\n",
        );
        assert_eq!(elements.links(), vec!["#anchor", "c.md", "https://b.org"]);
    }

    #[test]
    fn images_keep_document_order_and_duplicates() {
        let elements =
            extract_elements("![second **bold**](b.png)\n\n![first](a.png) ![again](b.png)\n");
        assert_eq!(
            elements.images,
            vec![
                Image { title: "second bold".into(), src: "b.png".into() },
                Image { title: "first".into(), src: "a.png".into() },
                Image { title: "again".into(), src: "b.png".into() },
            ]
        );
        assert!(elements.links.is_empty());
    }

    #[test]
    fn image_alt_text_counts_toward_heading() {
        let elements = extract_elements("# Logo ![mark](logo.png)\n");
        assert_eq!(elements.headings[0].text, "Logo mark");
        assert_eq!(elements.images[0].title, "mark");
    }

    #[test]
    fn empty_document() {
        assert_eq!(extract_elements(""), Elements::default());
    }
}
