use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use pagewright_core::{Format, MemoryWriter};
use pagewright_dev_server::{DevServer, DevServerConfig};

use super::{add_common_args, inputs, load_site};
use crate::config::PagewrightConfig;

pub fn make_subcommand() -> Command {
    add_common_args(Command::new("serve"))
        .about("Render the site as HTML and serve it from memory")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16))
                .help("Port to serve on [default: 8000]"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = PagewrightConfig::load(args)?;
    // The server always shows HTML, whatever --format says
    let files = {
        let site = load_site(&inputs(args), &config)?;
        site.write_files(Format::Html, MemoryWriter::default())?.into_files()
    };
    tracing::info!(files = files.len(), "Rendered site into memory");

    let server_config = DevServerConfig {
        host: config.serve.host.clone(),
        port: config.serve.port,
        open: config.serve.open,
    };
    DevServer::new(server_config, files).run().await
}
