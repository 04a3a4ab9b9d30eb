use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgMatches, Command};
use pagewright_core::{FileContent, FileWriter, Format, Site, Writer};

use super::{add_common_args, inputs, load_site};
use crate::config::PagewrightConfig;

pub fn make_subcommand() -> Command {
    add_common_args(Command::new("render")).about("Render pages to stdout or an output directory")
}

pub fn execute(args: &ArgMatches) -> Result<ExitCode> {
    let inputs = inputs(args);
    let mut out = std::io::stdout().lock();
    if !check_inputs(&mut out, &inputs)? {
        return Ok(ExitCode::FAILURE);
    }

    let config = PagewrightConfig::load(args)?;
    let format = config.format()?;
    let site = load_site(&inputs, &config)?;

    if config.build.output == "-" {
        write_files(&mut out, &site, format)?;
    } else {
        let root = std::path::absolute(&config.build.output)?;
        let writer = site.write_files(format, FileWriter::new(&root)?)?;
        writeln!(out, "Wrote {} files to {}", writer.files().len(), writer.root().display())?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Report a missing input. Returns whether there is anything to render.
fn check_inputs<W: Write>(out: &mut W, inputs: &[&str]) -> Result<bool> {
    if inputs.is_empty() {
        writeln!(out, "Need to specify at least one input")?;
        return Ok(false);
    }
    Ok(true)
}

/// Print every exported file under a separator line; binary files only by size.
fn write_files<W: Write>(out: &mut W, site: &Site, format: Format) -> Result<()> {
    let rule = "-".repeat(32);
    for file in site.iter_files(format) {
        let (filename, content) = file?;
        writeln!(out)?;
        writeln!(out, "{rule} {} {rule}", filename.display())?;
        match content {
            FileContent::Text(text) => writeln!(out, "{text}")?,
            FileContent::Bytes(bytes) => writeln!(out, "{} bytes", bytes.len())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::data;

    #[test]
    fn no_input() {
        let mut out = Vec::new();
        assert!(!check_inputs(&mut out, &[]).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Need to specify at least one input\n");

        let mut out = Vec::new();
        assert!(check_inputs(&mut out, &["page.md"]).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn prints_files_with_separators() {
        let config = PagewrightConfig::default();
        let input = data("images_no_fm.md");
        let site = load_site(&[input.to_str().unwrap()], &config).unwrap();

        let mut out = Vec::new();
        write_files(&mut out, &site, Format::Markdown).unwrap();

        let rule = "-".repeat(32);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "\n{rule} docs/image1.png {rule}\n9 bytes\n\
                 \n{rule} docs/sub-path/image2.png {rule}\n9 bytes\n\
                 \n{rule} docs/images-no-fm.md {rule}\n\
                 ![image 1](image1.png)\n\nHere is ![image 2](sub-path/image2.png).\n\n"
            )
        );
    }

    #[test]
    fn writes_to_output_directory() {
        let out = tempfile::tempdir().unwrap();
        let config = PagewrightConfig::default();
        let input = data("no_front_matter.md");
        let site = load_site(&[input.to_str().unwrap()], &config).unwrap();

        site.write_files(Format::Html, FileWriter::new(out.path()).unwrap())
            .unwrap();
        let html = std::fs::read_to_string(out.path().join("docs/no-front-matter.html")).unwrap();
        assert!(html.contains("<title>headline 1</title>"), "{html}");
    }
}
