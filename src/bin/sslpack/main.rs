//! sslpack CLI - configure, build and package OpenSSL

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sslpack::util::diagnostic::emit;
use sslpack::util::Shell;
use sslpack::BuildError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.no_color);

    if let Err(e) = run(cli, &shell) {
        match e.downcast_ref::<BuildError>() {
            Some(err) => emit(&err.to_diagnostic(), shell.use_color()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("sslpack=debug")
    } else if cli.quiet {
        EnvFilter::new("sslpack=error")
    } else {
        EnvFilter::new("sslpack=info")
    };

    // stdout is reserved for command output (plans, completions)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Package(args) => commands::package::execute(args, shell),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Fetch(args) => commands::fetch::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
