use std::path::PathBuf;

/// Everything that can go wrong while loading, rendering or exporting pages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parsing front-matter failed: {0}")]
    FrontMatter(String),

    #[error("Expected type '{expected}' for front-matter value '{key}', got '{actual}'")]
    FrontMatterType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("front-matter 'context' must be of type mapping, got '{actual}'")]
    ContextType { actual: &'static str },

    #[error("Can not add page without a slug: {page}")]
    MissingSlug { page: String },

    #[error("Trying to add page with existing path and slug '{key}'")]
    DuplicatePage { key: String },

    #[error("Need to specify a format, it can not be guessed from '{name}'")]
    UnknownFormat { name: String },

    #[error("'{operation}' is not implemented for format '{format}'")]
    Unsupported {
        operation: &'static str,
        format: &'static str,
    },

    #[error("Can not find '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("Associated file '{}' does not exist for '{page}'", .path.display())]
    MissingAsset { path: PathBuf, page: String },

    #[error("Absolute dir required for writer root, got '{}'", .0.display())]
    InvalidWriterRoot(PathBuf),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
