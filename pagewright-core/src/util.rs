//! Slug and path helpers shared by pages and sites.
//!
//! Paths handled here are URL-ish strings with `/` separators, not
//! platform paths, so the joins behave the same everywhere.

/// Turn arbitrary text into a lowercase, dash separated identifier.
///
/// Every run of whitespace or non-alphanumeric characters collapses into a
/// single `-`.
pub fn sluggify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug
}

/// Resolve `path` against the directory `base`, the way a browser resolves a
/// relative link.
///
/// URLs (anything containing `//`) and absolute paths replace the base, and
/// `.` / `..` segments are resolved.
pub fn join_path(base: &str, path: &str) -> String {
    if path.contains("//") {
        return path.to_owned();
    }
    if path.starts_with('/') {
        return remove_dot_segments(path);
    }
    if base.is_empty() {
        return path.to_owned();
    }

    let mut joined = String::with_capacity(base.len() + path.len() + 1);
    joined.push_str(base);
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    remove_dot_segments(&joined)
}

/// Lexical equivalent of `relpath`: the path that leads from directory `root`
/// to `path`. An empty root is the current directory.
pub fn relative_path(path: &str, root: &str) -> String {
    let path_parts = components(path);
    let root_parts = components(root);

    let common = path_parts
        .iter()
        .zip(root_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    for _ in common..root_parts.len() {
        parts.push("..");
    }
    parts.extend_from_slice(&path_parts[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn components(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    parts
}

fn remove_dot_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;

    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "." => {
                if i == last {
                    out.push("");
                }
            }
            ".." => {
                out.pop();
                if i == last {
                    out.push("");
                }
            }
            "" if i != last => {}
            s => out.push(s),
        }
    }

    let joined = out.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sluggify() {
        assert_eq!(sluggify("My Doc"), "my-doc");
        assert_eq!(sluggify("no_front_matter"), "no-front-matter");
        assert_eq!(sluggify("a  --  b"), "a-b");
        assert_eq!(sluggify("Ärger über"), "ärger-über");
        assert_eq!(sluggify("--x"), "-x");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("docs", "index.html"), "docs/index.html");
        assert_eq!(join_path("docs", "./index.html"), "docs/index.html");
        assert_eq!(join_path("docs/sub", "../index.html"), "docs/index.html");
        assert_eq!(join_path("docs/", "img/a.png"), "docs/img/a.png");
        assert_eq!(join_path("/home/me/site", "a.png"), "/home/me/site/a.png");
        assert_eq!(join_path("docs", "../../a.png"), "a.png");
    }

    #[test]
    fn test_join_path_keeps_urls_and_absolute_paths() {
        assert_eq!(
            join_path("docs", "https://example.com/a.png"),
            "https://example.com/a.png"
        );
        assert_eq!(join_path("docs", "//cdn.example.com/a.css"), "//cdn.example.com/a.css");
        assert_eq!(join_path("docs", "/static/./a.css"), "/static/a.css");
        assert_eq!(join_path("", "./a.png"), "./a.png");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("docs/a.png", "docs"), "a.png");
        assert_eq!(relative_path("images/a.png", "docs"), "../images/a.png");
        assert_eq!(relative_path("images/sub/a.png", ""), "images/sub/a.png");
        assert_eq!(relative_path("docs", "docs"), ".");
        assert_eq!(relative_path("a.png", "docs/deep"), "../../a.png");
        assert_eq!(relative_path("./docs/./a.png", "docs/"), "a.png");
    }
}
