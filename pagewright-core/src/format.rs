use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

/// Source and output formats understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Markdown,
    Html,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Html => "html",
        }
    }

    /// File extension used when exporting in this format.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Guess the input format of a source file. Only markdown is accepted as input.
    pub fn from_filename<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        if name.ends_with(".md") {
            Some(Format::Markdown)
        } else {
            None
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" => Ok(Format::Markdown),
            "html" => Ok(Format::Html),
            other => Err(Error::UnknownFormat {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_markdown_from_filename() {
        assert_eq!(Format::from_filename("docs/README.MD"), Some(Format::Markdown));
        assert_eq!(Format::from_filename("page.md"), Some(Format::Markdown));
        assert_eq!(Format::from_filename("layout.html"), None);
        assert_eq!(Format::from_filename("notes"), None);
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("md".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("html".parse::<Format>().unwrap(), Format::Html);
        assert!(matches!(
            "pdf".parse::<Format>(),
            Err(Error::UnknownFormat { .. })
        ));
    }
}
