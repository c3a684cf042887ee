//! `inkflow smooth` - smooth strokes from a JSON file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use futures::future::join_all;
use inkflow::{SmoothingEngine, Stroke};
use tracing::info;

use super::common::{read_strokes, render_strokes, resolve_config, StrokeFile, TierArg};
use crate::error::CliError;

/// Arguments for the smooth command.
#[derive(Debug, Args)]
pub struct SmoothArgs {
    /// Stroke file (one stroke object or an array of strokes)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Where to write the smoothed strokes (stdout if omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Quality tier (overrides the settings file)
    #[arg(long, value_enum)]
    pub tier: Option<TierArg>,

    /// INI settings file with a [smoothing] section
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Smooth on the calling thread under the sync time budget
    #[arg(long)]
    pub sync: bool,
}

/// Run the smooth command.
pub async fn run(args: SmoothArgs) -> Result<(), CliError> {
    let config = resolve_config(args.config.as_deref(), args.tier)?;
    let input = read_strokes(&args.input)?;
    let engine = SmoothingEngine::new(config)?;

    let smoothed: Vec<Stroke> = if args.sync {
        input.strokes.iter().map(|s| engine.smooth_sync(s)).collect()
    } else {
        let jobs = input
            .strokes
            .iter()
            .map(|s| engine.smooth_async(s.clone(), None, None));
        join_all(jobs).await
    };

    for (before, after) in input.strokes.iter().zip(&smoothed) {
        eprintln!("{}: {} -> {} points", before.id, before.len(), after.len());
    }

    let output = StrokeFile {
        strokes: smoothed,
        single: input.single,
    };
    let json = render_strokes(&output).map_err(|e| CliError::Encode(e.to_string()))?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).map_err(|e| CliError::io(path, e))?;
            info!(path = %path.display(), strokes = output.strokes.len(), "Wrote smoothed strokes");
        }
        None => println!("{}", json),
    }

    let summary = engine.performance_summary();
    info!(
        avg_ms = summary.avg_ms,
        max_ms = summary.max_ms,
        samples = summary.sample_count,
        "Smoothing complete"
    );
    Ok(())
}
