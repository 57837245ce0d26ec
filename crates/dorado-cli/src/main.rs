mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dorado", about = "Telescope night reduction and period analysis")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or save the default reduction config
    Config(commands::config::ConfigArgs),
    /// Show frame file metadata
    Info(commands::info::InfoArgs),
    /// Calibrate, align and measure one filter of a night
    Reduce(commands::reduce::ReduceArgs),
    /// Find maxima, O-C and frequencies of a light curve
    Analyze(commands::analyze::AnalyzeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Config(args) => commands::config::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Reduce(args) => commands::reduce::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
    }
}
