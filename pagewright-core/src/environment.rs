use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::template::{TemplateEngine, TemplateSource, find_template};

pub const DEFAULT_HTML_LAYOUT: &str = "base.html";

/// Where templates and source files are looked up, and how HTML is assembled.
pub struct Environment {
    search_paths: Vec<PathBuf>,
    html_default_layout: String,
    syntax_theme: Option<String>,
    engine: OnceCell<TemplateEngine>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Environment {
    /// Copies the configuration and path list. The template engine is rebuilt
    /// on first use.
    fn clone(&self) -> Self {
        Self {
            search_paths: self.search_paths.clone(),
            html_default_layout: self.html_default_layout.clone(),
            syntax_theme: self.syntax_theme.clone(),
            engine: OnceCell::new(),
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("search_paths", &self.search_paths)
            .field("html_default_layout", &self.html_default_layout)
            .field("syntax_theme", &self.syntax_theme)
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            html_default_layout: DEFAULT_HTML_LAYOUT.to_string(),
            syntax_theme: None,
            engine: OnceCell::new(),
        }
    }

    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut env = Self::new();
        env.add_search_path(paths, false);
        env
    }

    pub fn html_default_layout(&self) -> &str {
        &self.html_default_layout
    }

    pub fn set_html_default_layout<S: Into<String>>(&mut self, layout: S) {
        self.html_default_layout = layout.into();
    }

    pub fn syntax_theme(&self) -> Option<&str> {
        self.syntax_theme.as_deref()
    }

    pub fn set_syntax_theme(&mut self, theme: Option<String>) {
        self.syntax_theme = theme;
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add directories to the search path.
    ///
    /// With `front` the directories take priority over the existing ones, and
    /// the first directory given ends up first. Otherwise they are appended.
    pub fn add_search_path<I, P>(&mut self, paths: I, front: bool)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        if front {
            self.search_paths.splice(0..0, paths);
        } else {
            self.search_paths.extend(paths);
        }
        self.engine = OnceCell::new();
    }

    /// Resolve a file name. Absolute paths are returned if they exist,
    /// relative ones are tried against each search path in order.
    pub fn find_file<P: AsRef<Path>>(&self, name: P) -> Option<PathBuf> {
        let name = name.as_ref();
        if name.is_absolute() {
            return name.exists().then(|| name.to_path_buf());
        }

        self.search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.exists())
    }

    /// Resolve a template name, falling back to the templates built into the crate.
    pub fn find_template(&self, name: &str) -> Result<TemplateSource> {
        if Path::new(name).is_absolute() {
            let path = PathBuf::from(name);
            return if path.is_file() {
                Ok(TemplateSource::File(path))
            } else {
                Err(Error::NotFound(path))
            };
        }
        find_template(&self.search_paths, name).ok_or_else(|| Error::NotFound(PathBuf::from(name)))
    }

    /// The template engine for the current search path, built on first use.
    pub fn template_engine(&self) -> &TemplateEngine {
        self.engine.get_or_init(|| {
            tracing::debug!(search_paths = ?self.search_paths, "Building template engine");
            TemplateEngine::new(self.search_paths.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_search_path_front_and_back() {
        let mut env = Environment::with_search_paths(["b"]);
        env.add_search_path(["c"], false);
        env.add_search_path(["x", "a"], true);
        assert_eq!(
            env.search_paths(),
            &[
                PathBuf::from("x"),
                PathBuf::from("a"),
                PathBuf::from("b"),
                PathBuf::from("c")
            ]
        );
    }

    #[test]
    fn engine_is_rebuilt_when_paths_change() {
        let mut env = Environment::with_search_paths(["one"]);
        assert_eq!(env.template_engine().search_paths(), &[PathBuf::from("one")]);

        env.add_search_path(["two"], true);
        assert_eq!(
            env.template_engine().search_paths(),
            &[PathBuf::from("two"), PathBuf::from("one")]
        );
    }

    #[test]
    fn find_file_in_search_paths() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("page.md"), "# Page").unwrap();

        let env = Environment::with_search_paths([first.path(), second.path()]);
        assert_eq!(env.find_file("page.md"), Some(second.path().join("page.md")));
        assert_eq!(env.find_file("missing.md"), None);

        let absolute = second.path().join("page.md");
        assert_eq!(env.find_file(&absolute), Some(absolute.clone()));
        assert_eq!(env.find_file(second.path().join("nope.md")), None);
    }

    #[test]
    fn clone_copies_configuration() {
        let mut env = Environment::with_search_paths(["a"]);
        env.set_html_default_layout("page.html");
        env.set_syntax_theme(Some("InspiredGitHub".into()));

        let mut copy = env.clone();
        copy.add_search_path(["b"], true);

        assert_eq!(env.search_paths(), &[PathBuf::from("a")]);
        assert_eq!(copy.search_paths(), &[PathBuf::from("b"), PathBuf::from("a")]);
        assert_eq!(copy.html_default_layout(), "page.html");
        assert_eq!(copy.syntax_theme(), Some("InspiredGitHub"));
    }

    #[test]
    fn find_template_uses_builtins() {
        let env = Environment::new();
        assert!(matches!(
            env.find_template("base.html"),
            Ok(TemplateSource::Builtin(_))
        ));
        assert!(matches!(
            env.find_template("other.html"),
            Err(Error::NotFound(_))
        ));
    }
}
