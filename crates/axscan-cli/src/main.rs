//! axscan CLI - command-line interface for the axscan accessibility checker
//!
//! Scans web projects statically, normalizes recorded DOM audits of rendered
//! pages, and merges saved reports into one severity-ranked view.

mod cli;
mod commands;
mod logging;
mod output;

use std::env;
use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use commands::Commands;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli);
    configure_colors(cli.no_color);

    match cli.command {
        Commands::Scan(args) => args.run(),
        Commands::Audit(args) => args.run().await,
        Commands::Report(args) => args.run(),
        Commands::Explain(args) => args.run().await,
        Commands::Rules(args) => args.run(),
        Commands::Guidelines(args) => args.run().await,
    }
}

fn configure_colors(no_color: bool) {
    if no_color || env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}
