//! Adaptive staircase CLI entry point.

use anyhow::Result;
use clap::Parser;

use adaptive_staircase::cli::{commands, Cli, Commands};
use adaptive_staircase::infrastructure::config::{AppConfig, ConfigLoader};
use adaptive_staircase::infrastructure::logging::LoggerImpl;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => adaptive_staircase::cli::handle_error(err, cli.json),
    };

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err}");
            None
        }
    };

    let result = match cli.command {
        Commands::Replay(args) => commands::replay::execute(args, &config, cli.json),
        Commands::Simulate(args) => commands::simulate::execute(args, &config, cli.json),
        Commands::Config(args) => commands::config::execute(args, &config, cli.json),
    };

    if let Err(err) = result {
        adaptive_staircase::cli::handle_error(err, cli.json);
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
