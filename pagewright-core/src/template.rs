use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::error::Result;

/// Templates shipped with the crate, looked up after every search path.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[("base.html", include_str!("../templates/base.html"))];

/// Name under which an inline template source is registered for rendering.
const INLINE_TEMPLATE: &str = "__inline__";

static TEMPLATE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*(?:extends|include|import)\s+["']([^"']+)["']"#)
        .expect("template reference pattern is valid")
});

static PRINTED_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{-?\s*([A-Za-z_][A-Za-z0-9_]*)\s*([^}]*)\}\}")
        .expect("printed variable pattern is valid")
});

/// Where a named template was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Builtin(&'static str),
}

impl TemplateSource {
    pub fn read(&self) -> Result<String> {
        match self {
            TemplateSource::File(path) => Ok(std::fs::read_to_string(path)?),
            TemplateSource::Builtin(source) => Ok((*source).to_string()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            TemplateSource::File(path) => Some(path),
            TemplateSource::Builtin(_) => None,
        }
    }
}

/// Look up a template name in the search paths, then in the built-in templates.
pub fn find_template(search_paths: &[PathBuf], name: &str) -> Option<TemplateSource> {
    search_paths
        .iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
        .map(TemplateSource::File)
        .or_else(|| {
            BUILTIN_TEMPLATES
                .iter()
                .find(|(builtin, _)| *builtin == name)
                .map(|(_, source)| TemplateSource::Builtin(source))
        })
}

/// Tera bound to an ordered list of template directories.
///
/// Referenced templates (`extends`, `include`, `import`) are loaded lazily
/// from the search path the first time a source mentions them, and stay
/// registered for later renders.
///
/// Plain variables printed by any loaded source (`{{ name }}`) render as an
/// empty string when the context does not define them.
pub struct TemplateEngine {
    search_paths: Vec<PathBuf>,
    tera: RefCell<Tera>,
    printed: RefCell<BTreeSet<String>>,
}

impl TemplateEngine {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        Self {
            search_paths,
            tera: RefCell::new(tera),
            printed: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Render a template source string with the given context.
    pub fn render_str(&self, source: &str, context: &Map<String, Value>) -> Result<String> {
        let mut tera = self.tera.borrow_mut();

        let mut printed = self.printed.borrow_mut();

        let mut templates = self.load_references(source, &tera)?;
        templates.push((INLINE_TEMPLATE.to_string(), source.to_string()));
        for (_, text) in &templates {
            printed.extend(printed_variables(text));
        }
        tera.add_raw_templates(templates)?;

        let mut context = Context::from_serialize(context)?;
        for name in printed.iter() {
            if !context.contains_key(name) {
                context.insert(name.as_str(), "");
            }
        }
        Ok(tera.render(INLINE_TEMPLATE, &context)?)
    }

    fn load_references(&self, source: &str, tera: &Tera) -> Result<Vec<(String, String)>> {
        let registered: HashSet<&str> = tera.get_template_names().collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending = references(source);
        let mut loaded = Vec::new();

        while let Some(name) = pending.pop() {
            if registered.contains(name.as_str()) || !seen.insert(name.clone()) {
                continue;
            }
            // Unresolvable names are left for tera to report at render time.
            let Some(found) = find_template(&self.search_paths, &name) else {
                tracing::debug!(template = %name, "Template not found in search path");
                continue;
            };
            let text = found.read()?;
            tracing::debug!(template = %name, source = ?found.path(), "Loaded template");
            pending.extend(references(&text));
            loaded.push((name, text));
        }

        Ok(loaded)
    }
}

fn references(source: &str) -> Vec<String> {
    TEMPLATE_REFERENCE
        .captures_iter(source)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Top-level names printed as plain values. Attribute access, calls and
/// expressions with a `default` filter are left alone.
fn printed_variables(source: &str) -> Vec<String> {
    PRINTED_VARIABLE
        .captures_iter(source)
        .filter(|captures| {
            let rest = captures[2].trim_start();
            !rest.starts_with(['.', '[', '(']) && !rest.contains("default(")
        })
        .map(|captures| captures[1].to_string())
        .filter(|name| !matches!(name.as_str(), "true" | "false" | "loop" | "super" | "not"))
        .collect()
}
