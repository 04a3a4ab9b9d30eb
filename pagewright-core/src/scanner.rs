use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::format::Format;

/// Expand input paths into source files.
///
/// Files are kept as given. Directories are walked recursively for markdown
/// files, in sorted order.
pub fn collect_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            files.extend(get_all_markdown_files(input)?);
        } else if input.exists() {
            files.push(input.to_path_buf());
        } else {
            return Err(Error::NotFound(input.to_path_buf()));
        }
    }

    Ok(files)
}

fn get_all_markdown_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if entry.file_type().is_file() && Format::from_filename(entry.path()).is_some() {
            paths.push(entry.into_path());
        }
    }
    tracing::debug!(dir = %path.display(), count = paths.len(), "Scanned directory");

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.md"), "# b").unwrap();
        std::fs::write(dir.path().join("a.md"), "# a").unwrap();
        std::fs::write(dir.path().join("sub/c.md"), "# c").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8]).unwrap();

        let single = dir.path().join("sub/c.md");
        let files = collect_inputs(&[single.clone(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            files,
            vec![
                single,
                dir.path().join("a.md"),
                dir.path().join("b.md"),
                dir.path().join("sub/c.md"),
            ]
        );
    }

    #[test]
    fn missing_input() {
        assert!(matches!(
            collect_inputs(&["/no/such/input.md"]),
            Err(Error::NotFound(_))
        ));
    }
}
