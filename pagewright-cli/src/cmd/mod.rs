use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use pagewright_core::{Environment, Page, Site, collect_inputs};

use crate::config::PagewrightConfig;

pub mod info;
pub mod render;
pub mod serve;
pub mod site_info;

/// Arguments every subcommand accepts.
pub fn add_common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .num_args(0..)
                .help("Source files or directories"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory, or '-' for stdout [default: -]"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .value_parser(["md", "html"])
                .help("Output format [default: md]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./pagewright.toml]"),
        )
}

pub fn inputs(args: &ArgMatches) -> Vec<&str> {
    args.get_many::<String>("input")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default()
}

/// Load every input as a page, mounted under the configured mount path.
pub fn load_site(inputs: &[&str], config: &PagewrightConfig) -> Result<Site> {
    let site_config = &config.core.site;
    let env: Environment = site_config.environment();
    let mut site = Site::with_config(site_config);

    for file in collect_inputs(inputs)? {
        let file = std::path::absolute(&file)?;
        let page = Page::from_file(&file, None, Some(&env))
            .with_context(|| format!("Failed to load {}", file.display()))?;
        site.add_page([page], site_config.mount_path())?;
    }

    Ok(site)
}
