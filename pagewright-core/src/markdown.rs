use std::collections::BTreeMap;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Authored reference -> exported reference, applied right before the final render.
pub type LinkMapping = BTreeMap<String, String>;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Parser options shared by rendering and element extraction.
///
/// Smart punctuation stays off so text like `--` survives untouched.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render markdown to HTML, retargeting links and images through `link_mapping`.
///
/// With a `syntax_theme`, fenced code blocks are highlighted with syntect.
pub fn render_html(markdown: &str, link_mapping: &LinkMapping, syntax_theme: Option<&str>) -> String {
    let events: Vec<Event> = Parser::new_ext(markdown, markdown_options())
        .map(|event| replace_element_links(event, link_mapping))
        .collect();

    let events = match syntax_theme.and_then(|name| THEME_SET.themes.get(name)) {
        Some(theme) => highlight_code_blocks(events, theme),
        None => {
            if let Some(name) = syntax_theme {
                tracing::warn!(theme = name, "Unknown syntax theme, code blocks stay plain");
            }
            events
        }
    };

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Rewrite the destination of a link or image event when it exactly matches
/// a key of `mapping`. Every other event passes through unchanged.
pub fn replace_element_links<'a>(event: Event<'a>, mapping: &LinkMapping) -> Event<'a> {
    match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: remap(dest_url, mapping),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: remap(dest_url, mapping),
            title,
            id,
        }),
        other => other,
    }
}

fn remap<'a>(dest: CowStr<'a>, mapping: &LinkMapping) -> CowStr<'a> {
    match mapping.get(dest.as_ref()) {
        Some(target) => CowStr::from(target.clone()),
        None => dest,
    }
}

/// Textual link rewrite for markdown output: every `(old)` becomes `(new)`.
///
/// This works on the source text, so any parenthesised text equal to a mapped
/// path is rewritten too, not only link destinations.
pub fn replace_markdown_links(markdown: &str, mapping: &LinkMapping) -> String {
    let mut out = markdown.to_string();
    for (old, new) in mapping {
        out = out.replace(&format!("({old})"), &format!("({new})"));
    }
    out
}

fn highlight_code_blocks<'a>(
    events: Vec<Event<'a>>,
    theme: &syntect::highlighting::Theme,
) -> Vec<Event<'a>> {
    let mut processed = Vec::with_capacity(events.len());
    let mut events = events.into_iter();

    while let Some(event) = events.next() {
        let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) = event else {
            processed.push(event);
            continue;
        };

        // Collect all text events until the end of the code block
        let mut code = String::new();
        for inner in events.by_ref() {
            match inner {
                Event::End(TagEnd::CodeBlock) => break,
                Event::Text(text) => code.push_str(&text),
                _ => {}
            }
        }

        let syntax = SYNTAX_SET.find_syntax_by_token(&lang).or_else(|| {
            // Fallback mappings for unsupported languages
            match lang.as_ref() {
                "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
                _ => None,
            }
        });

        let highlighted = syntax
            .and_then(|syntax| highlighted_html_for_string(&code, &SYNTAX_SET, syntax, theme).ok())
            .unwrap_or_else(|| format!("<pre><code>{}</code></pre>\n", html_escape::encode_text(&code)));

        processed.push(Event::Html(highlighted.into()));
    }

    processed
}
