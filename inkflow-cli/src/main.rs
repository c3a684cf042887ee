//! InkFlow CLI - Command-line interface
//!
//! Smooths stroke files, recommends settings for the current machine and
//! benchmarks the smoothing engine.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use inkflow::logging::{init_logging, LogConfig};

use commands::{bench, recommend, smooth};

#[derive(Debug, Parser)]
#[command(name = "inkflow", version, about = "Asynchronous ink stroke smoothing")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Smooth strokes from a JSON file
    Smooth(smooth::SmoothArgs),

    /// Print the recommended configuration for this machine
    Recommend(recommend::RecommendArgs),

    /// Benchmark the engine with synthetic strokes
    Bench(bench::BenchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::verbose(cli.verbose);
    if let Some(path) = &cli.log_file {
        log_config = log_config.with_log_file(path);
    }
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    let result = match cli.command {
        Commands::Smooth(args) => smooth::run(args).await,
        Commands::Recommend(args) => recommend::run(args),
        Commands::Bench(args) => bench::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
