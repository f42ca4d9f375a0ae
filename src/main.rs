mod agents;
mod cli;
mod error;
mod index;
mod interrupt;
mod pypi;
mod requirement;
mod resolver;
mod workflow;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use error::AscentError;
use std::process;
use tracing_subscriber::EnvFilter;
use workflow::RunOptions;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = workflow::execute_upgrade(&RunOptions::from(&cli));

    match result {
        Ok(()) => {}
        Err(AscentError::UserCancelled) | Err(AscentError::VirtualenvMissing) => {
            println!("\n{}", "Upgrade interrupted.".red());
        }
        Err(AscentError::Selection(message)) => {
            println!("{}", message.red());
            println!("\n{}", "Upgrade interrupted.".red());
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}
