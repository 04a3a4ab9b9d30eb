use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::elements::{Elements, extract_elements};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::frontmatter::{FrontMatter, ValueKind, split_front_matter_and_markup};
use crate::markdown::{LinkMapping, render_html};

/// The body of a document together with its format, front-matter and origin.
///
/// The body may contain template directives. It is rendered once, on the
/// first call to [`Markup::markup`]; later calls return the same text even
/// when given another context.
#[derive(Debug)]
pub struct Markup {
    template: String,
    format: Format,
    front_matter: Option<FrontMatter>,
    filename: Option<PathBuf>,
    rendered: OnceCell<String>,
}

impl Markup {
    pub fn new(
        template: String,
        format: Format,
        front_matter: Option<FrontMatter>,
        filename: Option<PathBuf>,
    ) -> Self {
        Self {
            template,
            format,
            front_matter,
            filename,
            rendered: OnceCell::new(),
        }
    }

    /// Parse an in-memory document.
    pub fn from_string(text: &str, format: Format) -> Result<Self> {
        let (front_matter, markup) = split_front_matter_and_markup(text)?;
        Ok(Self::new(markup, format, front_matter, None))
    }

    pub fn from_markdown<P: AsRef<Path>>(path: P, env: Option<&Environment>) -> Result<Self> {
        Self::from_file(path, Some(Format::Markdown), env)
    }

    /// Read a document from disk.
    ///
    /// Without a format it is guessed from the file name. With an environment
    /// the name is resolved through its search paths.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        format: Option<Format>,
        env: Option<&Environment>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let format = match format {
            Some(format) => format,
            None => Format::from_filename(path).ok_or_else(|| Error::UnknownFormat {
                name: path.display().to_string(),
            })?,
        };

        let filename = match env {
            Some(env) => env
                .find_file(path)
                .ok_or_else(|| Error::NotFound(path.to_path_buf()))?,
            None => path.to_path_buf(),
        };

        let text = std::fs::read_to_string(&filename).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(filename.clone()),
            _ => Error::Io(e),
        })?;
        let (front_matter, markup) = split_front_matter_and_markup(&text)?;

        Ok(Self::new(markup, format, front_matter, Some(filename)))
    }

    /// Load a layout by template name, including the built-in templates.
    pub fn from_template(name: &str, format: Format, env: &Environment) -> Result<Self> {
        let source = env.find_template(name)?;
        let (front_matter, markup) = split_front_matter_and_markup(&source.read()?)?;
        Ok(Self::new(
            markup,
            format,
            front_matter,
            source.path().map(Path::to_path_buf),
        ))
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn front_matter(&self) -> Option<&FrontMatter> {
        self.front_matter.as_ref()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Return a front-matter value if the key is present, otherwise `default`.
    ///
    /// Any present value overrides the default, even `null`. With
    /// `type_check`, a present value of another kind is an error.
    pub fn get_front_matter_value(
        &self,
        key: &str,
        default: Value,
        type_check: Option<ValueKind>,
    ) -> Result<Value> {
        let Some(value) = self.front_matter.as_ref().and_then(|fm| fm.get(key)) else {
            return Ok(default);
        };

        if let Some(expected) = type_check {
            let actual = ValueKind::of(value);
            if actual != expected {
                return Err(Error::FrontMatterType {
                    key: key.to_string(),
                    expected: expected.name(),
                    actual: actual.name(),
                });
            }
        }

        Ok(value.clone())
    }

    /// The template-expanded body, ending in exactly one newline.
    pub fn markup(&self, context: &Map<String, Value>, env: &Environment) -> Result<&str> {
        if let Some(rendered) = self.rendered.get() {
            return Ok(rendered);
        }

        let mut rendered = if self.template.contains("{%") || self.template.contains("{{") {
            env.template_engine().render_str(&self.template, context)?
        } else {
            self.template.clone()
        };
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }

        Ok(self.rendered.get_or_init(|| rendered))
    }

    /// HTML for this markup. Markdown is rendered with links retargeted
    /// through `link_mapping`; HTML is returned as rendered.
    pub fn to_html(
        &self,
        context: &Map<String, Value>,
        env: &Environment,
        link_mapping: &LinkMapping,
    ) -> Result<String> {
        let markup = self.markup(context, env)?;
        match self.format {
            Format::Html => Ok(markup.to_string()),
            Format::Markdown => Ok(render_html(markup, link_mapping, env.syntax_theme())),
        }
    }

    pub fn get_elements(&self, context: &Map<String, Value>, env: &Environment) -> Result<Elements> {
        if self.format != Format::Markdown {
            return Err(Error::Unsupported {
                operation: "get_elements",
                format: self.format.as_str(),
            });
        }
        Ok(extract_elements(self.markup(context, env)?))
    }
}
