//! Front-matter splitting.
//!
//! A document may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! # Body
//! ```

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Decoded front-matter: an insertion-ordered mapping of YAML values.
pub type FrontMatter = Map<String, Value>;

const DELIMITER: &str = "---";

/// Split a text into its front-matter and markup.
///
/// The returned markup always ends with a single newline. Texts with fewer
/// than four lines, texts not starting with `---` and texts where the closing
/// `---` is missing have no front-matter and are returned whole.
pub fn split_front_matter_and_markup(text: &str) -> Result<(Option<FrontMatter>, String)> {
    let lines: Vec<&str> = text.trim().lines().collect();

    if lines.len() < 4 || lines[0].trim() != DELIMITER {
        return Ok((None, join_lines(&lines)));
    }

    let Some(end) = lines.iter().skip(1).position(|line| *line == DELIMITER) else {
        return Ok((None, join_lines(&lines)));
    };
    let end = end + 1;

    let front_matter = parse_front_matter(&lines[1..end].join("\n"))?;
    Ok((front_matter, join_lines(&lines[end + 1..])))
}

fn join_lines(lines: &[&str]) -> String {
    let mut joined = lines.join("\n");
    joined.push('\n');
    joined
}

fn parse_front_matter(block: &str) -> Result<Option<FrontMatter>> {
    if block.trim().is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_yaml::from_str(block).map_err(|e| Error::FrontMatter(e.to_string()))?;

    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(Error::FrontMatter(format!(
            "expected a mapping, got {}",
            ValueKind::of(&other)
        ))),
    }
}

/// The kind of a front-matter value, used for type checks and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    List,
    Mapping,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Mapping,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Mapping => "mapping",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
