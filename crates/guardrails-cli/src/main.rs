//! Guardrails - Entry Point
//!
//! Exit status: 0 when the check passed, 1 when it found violations or
//! invalid artifacts, 2 when the invocation itself failed.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Command};
use guardrails::GuardrailsConfig;
use std::process::ExitCode;

const EXIT_FAILED: u8 = 1;
const EXIT_INVOCATION: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_INVOCATION)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    logging::init_logging(&cli.log_level, cli.log_json)?;

    let mut config = GuardrailsConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    match &cli.command {
        Command::Boundaries { root } => commands::run_boundaries(&config, root),
        Command::Artifacts { dir, batch } => commands::run_artifacts(&config, dir, *batch),
        Command::Config => commands::print_config(&config).map(|()| true),
    }
}
