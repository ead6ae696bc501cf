/// CLI argument definitions for the `cens` command.
///
/// Defines all subcommands, their arguments, and long help text
/// using the `clap` derive macros.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::cli_help;

/// Top-level CLI parser with a single subcommand selector.
#[derive(Parser)]
#[command(name = "cens", version, about = "Census area scoring, tiering and budget allocation")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline and write every output
    #[command(long_about = cli_help::RUN)]
    Run {
        /// Run configuration (TOML)
        config: PathBuf,

        /// Output directory (overrides [output].dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a config and load its inputs without writing anything
    Check {
        /// Run configuration (TOML)
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Allocate a budget over a ranked CSV in row order
    #[command(long_about = cli_help::ALLOCATE)]
    Allocate {
        /// Ranked CSV (e.g. a selection output)
        csv: PathBuf,

        /// Column holding each area's need in units
        #[arg(long)]
        need: String,

        /// Total budget in whole dollars
        #[arg(long)]
        budget: u64,

        /// Cost of one unit in whole dollars
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        cost_per_unit: u64,

        /// Scenario name used in the report
        #[arg(long, default_value = "greedy")]
        strategy: String,

        /// Area id column
        #[arg(long, default_value = "area_id")]
        id_column: String,

        /// Write the ledger CSV to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}
