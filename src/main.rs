mod allocate;
mod classify;
mod cli;
mod cli_help;
mod config;
mod error;
mod load;
mod pipeline;
mod population;
mod predicate;
mod rank;
mod report;
mod report_helpers;
mod score;
mod stats;
mod telemetry;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};
use error::Error;

fn dispatch(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Run { config, out, json } => pipeline::run(&config, out.as_deref(), json),
        Commands::Check { config, json } => pipeline::check(&config, json),
        Commands::Allocate {
            csv,
            need,
            budget,
            cost_per_unit,
            strategy,
            id_column,
            out,
            json,
        } => allocate::run(&allocate::AllocateArgs {
            csv: &csv,
            id_column: &id_column,
            need: &need,
            strategy: &strategy,
            budget,
            cost_per_unit,
            out: out.as_deref(),
            json,
        }),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "cens", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = telemetry::init(cli.verbose)
        .map_err(Error::from)
        .and_then(|()| dispatch(cli.command));
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
