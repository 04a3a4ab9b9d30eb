use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Content of an exported file: rendered documents are text, assets are bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Bytes(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        FileContent::Bytes(bytes)
    }
}

/// Destination for exported files, addressed relative to a root directory.
pub trait Writer {
    fn root(&self) -> &Path;

    fn write(&mut self, filename: &Path, content: FileContent) -> Result<()>;

    /// `filename` below the root. A leading `/` does not escape the root.
    fn full_filename(&self, filename: &Path) -> PathBuf {
        let relative = filename.strip_prefix("/").unwrap_or(filename);
        self.root().join(relative)
    }
}

fn check_root(root: PathBuf) -> Result<PathBuf> {
    if root.is_absolute() {
        Ok(root)
    } else {
        Err(Error::InvalidWriterRoot(root))
    }
}

/// Writes files to disk, creating directories as needed.
#[derive(Debug)]
pub struct FileWriter {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl FileWriter {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self {
            root: check_root(root.as_ref().to_path_buf())?,
            files: Vec::new(),
        })
    }

    /// Full paths of everything written so far, in order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Writer for FileWriter {
    fn root(&self) -> &Path {
        &self.root
    }

    fn write(&mut self, filename: &Path, content: FileContent) -> Result<()> {
        let full_name = self.full_filename(filename);
        if let Some(parent) = full_name.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_name, content.as_bytes())?;
        tracing::info!(path = %full_name.display(), bytes = content.len(), "Wrote file");
        self.files.push(full_name);
        Ok(())
    }
}

/// Keeps written files in memory, for tests and the dev server.
#[derive(Debug)]
pub struct MemoryWriter {
    root: PathBuf,
    files: BTreeMap<PathBuf, FileContent>,
}

impl Default for MemoryWriter {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            files: BTreeMap::new(),
        }
    }
}

impl MemoryWriter {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self {
            root: check_root(root.as_ref().to_path_buf())?,
            files: BTreeMap::new(),
        })
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, FileContent> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<PathBuf, FileContent> {
        self.files
    }
}

impl Writer for MemoryWriter {
    fn root(&self) -> &Path {
        &self.root
    }

    fn write(&mut self, filename: &Path, content: FileContent) -> Result<()> {
        let full_name = self.full_filename(filename);
        self.files.insert(full_name, content);
        Ok(())
    }
}
