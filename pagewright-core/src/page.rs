use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::elements::Elements;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::frontmatter::ValueKind;
use crate::markdown::{LinkMapping, replace_markdown_links};
use crate::markup::Markup;
use crate::util::{join_path, sluggify};

/// Heading level used when a page has no heading at all.
const NO_HEADING_LEVEL: u32 = 100;

/// Kind of a file that belongs to a page without being a document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Css,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Css => "css",
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(AssetKind::Image),
            "css" => Ok(AssetKind::Css),
            other => Err(format!("unknown file type '{other}'")),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image or stylesheet referenced by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociatedFile {
    pub kind: AssetKind,
    /// URLs (anything containing `//`) are only linked, never exported.
    pub external: bool,
    /// The reference as written in the page.
    pub path: String,
    /// The reference resolved against the page's directory.
    pub abs_path: String,
}

/// A single document: its markup plus everything derived from it.
pub struct Page {
    markup: Markup,
    env: Environment,
    context: Map<String, Value>,
    elements: OnceCell<Elements>,
    files: OnceCell<Vec<AssociatedFile>>,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.markup.filename() {
            Some(path) => write!(f, "Page({})", path.display()),
            None => write!(f, "Page(None)"),
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("markup", &self.markup)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Wrap a markup. The page's environment is a copy of `env` with the
    /// source file's directory in front, so templates next to the source win.
    pub fn new(markup: Markup, env: Option<&Environment>) -> Result<Self> {
        let mut page_env = env.cloned().unwrap_or_default();
        if let Some(dir) = markup.filename().and_then(Path::parent) {
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir
            };
            page_env.add_search_path([dir], true);
        }

        let mut context = Map::new();
        if let Some(fm) = markup.front_matter() {
            if let Some(title) = fm.get("title").filter(|v| is_truthy(v)) {
                context.insert("title".to_string(), title.clone());
            }
            if let Some(ctx) = fm.get("context").filter(|v| is_truthy(v)) {
                let Value::Object(ctx) = ctx else {
                    return Err(Error::ContextType {
                        actual: ValueKind::of(ctx).name(),
                    });
                };
                context.extend(ctx.clone());
            }
        }

        Ok(Self {
            markup,
            env: page_env,
            context,
            elements: OnceCell::new(),
            files: OnceCell::new(),
        })
    }

    pub fn from_file<P: AsRef<Path>>(
        path: P,
        format: Option<Format>,
        env: Option<&Environment>,
    ) -> Result<Self> {
        let markup = Markup::from_file(path, format, env)?;
        Self::new(markup, env)
    }

    pub fn from_markdown<P: AsRef<Path>>(path: P, env: Option<&Environment>) -> Result<Self> {
        Self::from_file(path, Some(Format::Markdown), env)
    }

    pub fn from_string(text: &str, format: Format, env: Option<&Environment>) -> Result<Self> {
        Self::new(Markup::from_string(text, format)?, env)
    }

    pub fn markup(&self) -> &Markup {
        &self.markup
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Front-matter `title`, else the text of the highest-level heading
    /// (first one on ties), else empty.
    pub fn title(&self) -> Result<String> {
        let mut highest = (NO_HEADING_LEVEL, "");
        for heading in &self.elements()?.headings {
            if heading.level < highest.0 {
                highest = (heading.level, heading.text.as_str());
            }
        }

        let title = self
            .markup
            .get_front_matter_value("title", Value::String(highest.1.to_string()), None)?;
        Ok(value_to_text(&title))
    }

    /// Front-matter `slug`, else the sluggified file stem, else empty.
    pub fn slug(&self) -> String {
        let from_filename = self
            .markup
            .filename()
            .and_then(Path::file_stem)
            .map(|stem| sluggify(&stem.to_string_lossy()))
            .map(Value::String)
            .unwrap_or(Value::Null);

        self.markup
            .front_matter()
            .and_then(|fm| fm.get("slug"))
            .map(value_to_text)
            .unwrap_or_else(|| value_to_text(&from_filename))
    }

    /// The layout template for an output format, if any.
    ///
    /// HTML defaults to the environment's layout, markdown has none. A
    /// front-matter `layout` overrides both, `layout: null` disables it.
    pub fn layout(&self, format: Format) -> Result<Option<String>> {
        let default = match format {
            Format::Html => Value::String(self.env.html_default_layout().to_string()),
            Format::Markdown => Value::Null,
        };

        match self.markup.get_front_matter_value("layout", default, None)? {
            Value::Null => Ok(None),
            Value::String(layout) if layout.is_empty() => Ok(None),
            Value::String(layout) => Ok(Some(layout)),
            other => Err(Error::FrontMatterType {
                key: "layout".to_string(),
                expected: ValueKind::String.name(),
                actual: ValueKind::of(&other).name(),
            }),
        }
    }

    pub fn elements(&self) -> Result<&Elements> {
        if let Some(elements) = self.elements.get() {
            return Ok(elements);
        }
        let elements = self.markup.get_elements(&self.context, &self.env)?;
        Ok(self.elements.get_or_init(|| elements))
    }

    /// Stylesheets from front-matter `css`, a single string or a list.
    pub fn css_files(&self) -> Result<Vec<String>> {
        match self.markup.get_front_matter_value("css", Value::Null, None)? {
            Value::String(css) if !css.is_empty() => Ok(vec![css]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(css) => Ok(css),
                    other => Err(Error::FrontMatterType {
                        key: "css".to_string(),
                        expected: ValueKind::String.name(),
                        actual: ValueKind::of(&other).name(),
                    }),
                })
                .collect(),
            value if !is_truthy(&value) => Ok(Vec::new()),
            other => Err(Error::FrontMatterType {
                key: "css".to_string(),
                expected: ValueKind::List.name(),
                actual: ValueKind::of(&other).name(),
            }),
        }
    }

    /// Images and stylesheets of this page, first reference wins for each
    /// resolved path.
    pub fn associated_files(&self) -> Result<&[AssociatedFile]> {
        if let Some(files) = self.files.get() {
            return Ok(files);
        }
        let files = self.collect_associated_files()?;
        Ok(self.files.get_or_init(|| files))
    }

    fn collect_associated_files(&self) -> Result<Vec<AssociatedFile>> {
        let root = match self.markup.filename() {
            Some(path) => source_dir(path)?,
            None => "/".to_string(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut files = Vec::new();
        let mut add = |kind: AssetKind, path: &str| {
            let external = path.contains("//");
            let abs_path = if external {
                path.to_string()
            } else {
                join_path(&root, path)
            };
            if seen.insert(abs_path.clone()) {
                files.push(AssociatedFile {
                    kind,
                    external,
                    path: path.to_string(),
                    abs_path,
                });
            }
        };

        for image in &self.elements()?.images {
            add(AssetKind::Image, &image.src);
        }
        for css in self.css_files()? {
            add(AssetKind::Css, &css);
        }

        Ok(files)
    }

    /// Markdown output: the rendered markup with links rewritten textually.
    pub fn to_md(&self, link_mapping: &LinkMapping) -> Result<String> {
        if self.markup.format() != Format::Markdown {
            return Err(Error::Unsupported {
                operation: "to_md",
                format: self.markup.format().as_str(),
            });
        }

        let markup = self.markup.markup(&self.context, &self.env)?;
        if link_mapping.is_empty() {
            Ok(markup.to_string())
        } else {
            Ok(replace_markdown_links(markup, link_mapping))
        }
    }

    /// HTML output: the rendered body, wrapped in the layout if there is one.
    ///
    /// The layout sees the page context plus `slug` and
    /// `html.{body, title, css}`.
    pub fn to_html(&self, link_mapping: &LinkMapping) -> Result<String> {
        if self.markup.format() != Format::Markdown {
            return Err(Error::Unsupported {
                operation: "to_html",
                format: self.markup.format().as_str(),
            });
        }

        let body = self.markup.to_html(&self.context, &self.env, link_mapping)?;
        let Some(layout) = self.layout(Format::Html)? else {
            return Ok(body);
        };

        let layout = Markup::from_template(&layout, Format::Html, &self.env)?;
        let title = self.title()?;

        let mut context = self.context.clone();
        context
            .entry("slug")
            .or_insert_with(|| Value::String(self.slug()));

        let html = context
            .entry("html")
            .or_insert_with(|| Value::Object(Map::new()));
        if !html.is_object() {
            *html = Value::Object(Map::new());
        }
        if let Value::Object(html) = html {
            html.entry("body").or_insert(Value::String(body));
            html.entry("title").or_insert(Value::String(title));

            let css = html.entry("css").or_insert(Value::Null);
            if !matches!(css, Value::Array(items) if !items.is_empty()) {
                *css = Value::Array(Vec::new());
            }
            if let Value::Array(css) = css {
                for file in self.css_files()? {
                    let file = link_mapping.get(&file).cloned().unwrap_or(file);
                    css.push(Value::String(file));
                }
            }
        }

        layout.to_html(&context, &self.env, link_mapping)
    }

    /// Export in the given format.
    pub fn render(&self, format: Format, link_mapping: &LinkMapping) -> Result<String> {
        match format {
            Format::Markdown => self.to_md(link_mapping),
            Format::Html => self.to_html(link_mapping),
        }
    }
}

fn source_dir(path: &Path) -> Result<String> {
    let absolute: PathBuf = match path.canonicalize() {
        Ok(path) => path,
        Err(_) => std::path::absolute(path)?,
    };
    Ok(absolute
        .parent()
        .map(|dir| dir.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        value if !is_truthy(value) => String::new(),
        other => other.to_string(),
    }
}
