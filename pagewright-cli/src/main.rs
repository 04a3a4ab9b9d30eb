mod cmd;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Command;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("pagewright")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render annotated markdown pages into a site")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(cmd::info::make_subcommand())
        .subcommand(cmd::site_info::make_subcommand())
        .subcommand(cmd::render::make_subcommand())
        .subcommand(cmd::serve::make_subcommand())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // PAGEWRIGHT_LOG controls verbosity, warnings only by default
    let filter = EnvFilter::try_from_env("PAGEWRIGHT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("info", args)) => cmd::info::execute(args)?,
        Some(("site-info", args)) => cmd::site_info::execute(args)?,
        Some(("render", args)) => return cmd::render::execute(args),
        Some(("serve", args)) => cmd::serve::execute(args).await?,
        Some((name, _)) => anyhow::bail!("Unknown command '{name}'"),
        None => anyhow::bail!("No command given"),
    }

    Ok(ExitCode::SUCCESS)
}
