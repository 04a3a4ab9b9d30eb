use std::io::Write;

use anyhow::Result;
use clap::{ArgMatches, Command};
use pagewright_core::{Format, Site};

use super::{add_common_args, inputs, load_site};
use crate::config::PagewrightConfig;

pub fn make_subcommand() -> Command {
    add_common_args(Command::new("site-info")).about("List every file the site would export")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = PagewrightConfig::load(args)?;
    let site = load_site(&inputs(args), &config)?;
    write_site_info(&mut std::io::stdout().lock(), &site, config.format()?)
}

fn write_site_info<W: Write>(out: &mut W, site: &Site, format: Format) -> Result<()> {
    writeln!(out, "--- {site} ---")?;
    writeln!(out, "  files:")?;
    for file in site.iter_files(format) {
        let (filename, content) = file?;
        writeln!(out, "    {:9} {}", content.len(), filename.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::data;

    #[test]
    fn lists_sizes() {
        let config = PagewrightConfig::default();
        let input = data("images_no_fm.md");
        let site = load_site(&[input.to_str().unwrap()], &config).unwrap();

        let mut out = Vec::new();
        write_site_info(&mut out, &site, Format::Markdown).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--- Site(1 pages) ---
  files:
            9 docs/image1.png
            9 docs/sub-path/image2.png
           65 docs/images-no-fm.md
"
        );
    }
}
