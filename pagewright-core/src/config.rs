use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::environment::{DEFAULT_HTML_LAYOUT, Environment};
use crate::page::AssetKind;

pub const DEFAULT_MOUNT_PATH: &str = "docs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory every page is exported under.
    pub mount_path: String,
    /// Layout used for HTML output unless a page names its own.
    pub html_default_layout: String,
    /// Extra template directories, searched after the page's own directory.
    pub search_paths: Vec<PathBuf>,
    /// Syntect theme for fenced code blocks in HTML output.
    pub syntax_theme: Option<String>,
    /// File type (`image`, `css`) -> export directory.
    pub file_type_paths: BTreeMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            html_default_layout: DEFAULT_HTML_LAYOUT.to_string(),
            search_paths: Vec::new(),
            syntax_theme: None,
            file_type_paths: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    pub fn environment(&self) -> Environment {
        let mut env = Environment::with_search_paths(&self.search_paths);
        env.set_html_default_layout(self.html_default_layout.clone());
        env.set_syntax_theme(self.syntax_theme.clone());
        env
    }

    /// The configured export directories, keyed by asset kind.
    /// Unknown file types are skipped.
    pub fn file_type_paths(&self) -> BTreeMap<AssetKind, String> {
        self.file_type_paths
            .iter()
            .filter_map(|(kind, dir)| match kind.parse::<AssetKind>() {
                Ok(kind) => Some((kind, dir.clone())),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring file_type_paths entry");
                    None
                }
            })
            .collect()
    }

    pub fn mount_path(&self) -> Option<&str> {
        if self.mount_path.is_empty() {
            None
        } else {
            Some(&self.mount_path)
        }
    }
}
