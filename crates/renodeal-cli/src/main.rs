mod commands;
mod input;
mod output;
mod store;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::deal::{RecalculateArgs, ScheduleArgs, SimulateArgs};

/// Feasibility simulation for buy-renovate-resell property deals
#[derive(Parser)]
#[command(
    name = "renodeal",
    version,
    about = "Feasibility simulation for buy-renovate-resell property deals",
    long_about = "Simulates the financing, costs, and returns of a property deal with \
                  decimal precision: quarterly drawdown waterfall across land loan, equity \
                  and support loan, interest and commission, margins, ROI and IRR."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine progress to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a deal from a request file, stdin, or flags
    Simulate(SimulateArgs),
    /// Print the calendar-quarter schedule for a purchase date and duration
    Schedule(ScheduleArgs),
    /// Recalculate a stored deal with overrides and save the run
    Recalculate(RecalculateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::deal::run_simulate(args),
        Commands::Schedule(args) => commands::deal::run_schedule(args),
        Commands::Recalculate(args) => commands::deal::run_recalculate(args),
        Commands::Version => {
            println!("renodeal {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
