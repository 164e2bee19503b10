mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::batch::BatchArgs;
use commands::bond::{AnalyzeArgs, ProfileArgs};
use commands::curve::BootstrapArgs;

/// Fixed-coupon bond analytics
#[derive(Parser)]
#[command(
    name = "bonds",
    version,
    about = "Fixed-coupon bond pricing, yield, risk and zero-curve bootstrapping",
    long_about = "A CLI for analysing fixed-coupon bullet bonds: price from yield, \
                  yield to maturity from price, Macaulay/modified duration and \
                  convexity, price/yield profiles, zero-curve bootstrapping and \
                  batch valuation of CSV or JSON bond lists."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver and bootstrap progress to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a bond from a yield, or solve its yield from a price, with risk metrics
    Analyze(AnalyzeArgs),
    /// Price a bond over a grid of yields around a centre yield
    Profile(ProfileArgs),
    /// Bootstrap a zero-coupon curve from benchmark instruments
    Bootstrap(BootstrapArgs),
    /// Value a CSV or JSON list of bonds
    Batch(BatchArgs),
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
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::bond::run_analyze(args),
        Commands::Profile(args) => commands::bond::run_profile(args),
        Commands::Bootstrap(args) => commands::curve::run_bootstrap(args),
        Commands::Batch(args) => commands::batch::run_batch(args),
        Commands::Version => {
            println!("bonds {}", env!("CARGO_PKG_VERSION"));
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
