use std::io::Write;

use anyhow::Result;
use clap::{ArgMatches, Command};
use pagewright_core::{Page, collect_inputs};

use super::{add_common_args, inputs};
use crate::config::PagewrightConfig;

pub fn make_subcommand() -> Command {
    add_common_args(Command::new("info")).about("Show what pagewright sees in each input page")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = PagewrightConfig::load(args)?;
    let env = config.core.site.environment();
    let mut out = std::io::stdout().lock();

    for file in collect_inputs(&inputs(args))? {
        let page = Page::from_file(std::path::absolute(&file)?, None, Some(&env))?;
        write_info(&mut out, &page)?;
    }

    Ok(())
}

fn write_info<W: Write>(out: &mut W, page: &Page) -> Result<()> {
    let front_matter = serde_json::to_string(&page.markup().front_matter())?;

    writeln!(out, "--- {page} ---")?;
    writeln!(out, "  format: {}", page.markup().format())?;
    writeln!(out, "  title: '{}'", page.title()?)?;
    writeln!(out, "  slug: '{}'", page.slug())?;
    writeln!(out, "  front-matter: {front_matter}")?;

    let files = page.associated_files()?;
    if !files.is_empty() {
        writeln!(out, "  files:")?;
        for file in files {
            let external = if file.external { " (external)" } else { "" };
            writeln!(out, "    ({}) {}{external}", file.kind, file.path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::data;

    fn info(name: &str) -> String {
        let page = Page::from_file(data(name), None, None).unwrap();
        let mut out = Vec::new();
        write_info(&mut out, &page).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn lists_associated_files() {
        let out = info("images_twice.md");
        let (header, details) = out.split_once('\n').unwrap();

        assert!(header.starts_with("--- Page(") && header.ends_with("images_twice.md) ---"));
        assert_eq!(
            details,
            r#"  format: md
  title: ''
  slug: 'images-twice'
  front-matter: {"css":["style.css","https://cdn.example.com/remote.css"]}
  files:
    (image) image1.png
    (image) https://example.com/remote.png (external)
    (css) style.css
    (css) https://cdn.example.com/remote.css (external)
"#
        );
    }

    #[test]
    fn page_without_files() {
        let out = info("front_matter.md");
        let (_, details) = out.split_once('\n').unwrap();
        assert_eq!(
            details,
            r#"  format: md
  title: 'The Title'
  slug: 'the-slug'
  front-matter: {"title":"The Title","slug":"the-slug"}
"#
        );
    }
}
