//! flowplan - Command Line Interface
//!
//! This is the main entry point for the production planner.
//! Run with `--help` to see all available options.

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::fs::{self, File};
use std::path::PathBuf;

use flowplan::{
    data::{load_dataset, load_settings},
    display::{display_flows, display_report},
    optimizer::optimize_production,
    ranking::{rank_recipes, write_ranking_csv, RankingOptions},
    solver::solver_for,
};

/// Command-line arguments for flowplan.
#[derive(Parser, Debug)]
#[command(name = "flowplan")]
#[command(author, version, about = "Plan factory production chains with linear programming", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve one production plan and print the results
    Solve {
        #[command(flatten)]
        input: Input,

        /// Print the report as JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,

        /// Also print the per-item production breakdown
        #[arg(long, default_value = "false")]
        flows: bool,
    },
    /// Score every alternative recipe and export the table as CSV
    Rank {
        #[command(flatten)]
        input: Input,

        /// Destination CSV file
        #[arg(short, long)]
        out: PathBuf,

        /// Ranking exclusions as JSON (defaults to the oil-chain exceptions)
        #[arg(long)]
        options: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct Input {
    /// Dataset JSON file
    #[arg(short, long)]
    data: PathBuf,

    /// Settings JSON file
    #[arg(short, long)]
    settings: PathBuf,

    /// LP backend
    #[arg(long, default_value = "minilp")]
    solver: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Solve { input, json, flows } => {
            let solver = solver_for(&input.solver)?;
            let dataset = load_dataset(&input.data)?;
            let settings = load_settings(&input.settings)?;

            let report = optimize_production(&dataset, &settings, solver.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display_report(&report);
                if flows {
                    display_flows(&report);
                }
            }
        }
        Command::Rank {
            input,
            out,
            options,
        } => {
            let solver = solver_for(&input.solver)?;
            let dataset = load_dataset(&input.data)?;
            let settings = load_settings(&input.settings)?;
            let options = match options {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => RankingOptions::default(),
            };

            let rows = rank_recipes(&dataset, &settings, solver.as_ref(), &options)?;
            write_ranking_csv(&rows, &dataset, File::create(&out)?)?;
            println!("Wrote {} ranking rows to {}", rows.len(), out.display());
        }
    }

    Ok(())
}
