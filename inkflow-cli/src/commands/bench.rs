//! `inkflow bench` - push synthetic strokes through the engine.
//!
//! All strokes are submitted at once so the concurrency limit is what
//! shapes throughput. The report shows latency, how many strokes came back
//! unchanged and the highest number of jobs that ran in parallel.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use inkflow::{Sample, SmoothingEngine, Stroke, StrokeIdAllocator};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{resolve_config, TierArg};
use crate::error::CliError;

/// Arguments for the bench command.
#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Number of strokes to submit
    #[arg(long, default_value_t = 200)]
    pub strokes: usize,

    /// Samples per stroke
    #[arg(long, default_value_t = 300)]
    pub points: usize,

    /// Quality tier (overrides the settings file)
    #[arg(long, value_enum)]
    pub tier: Option<TierArg>,

    /// INI settings file with a [smoothing] section
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cancel everything still running after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub cancel_after: Option<u64>,
}

/// Results of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub strokes: usize,
    pub unchanged: usize,
    pub peak_concurrency: usize,
    pub wall_time: Duration,
}

/// Run the bench command.
pub async fn run(args: BenchArgs) -> Result<(), CliError> {
    let config = resolve_config(args.config.as_deref(), args.tier)?;
    let engine = SmoothingEngine::new(config)?;
    info!(
        strokes = args.strokes,
        points = args.points,
        tier = %engine.config().quality_tier,
        "Starting benchmark"
    );

    let progress = ProgressBar::new(args.strokes as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} strokes ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let report = bench(&engine, &args, Some(&progress)).await;
    progress.finish_and_clear();

    let summary = engine.performance_summary();
    println!("Strokes:            {}", report.strokes);
    println!("Returned unchanged: {}", report.unchanged);
    println!("Peak concurrency:   {}", report.peak_concurrency);
    println!("Wall time:          {:.1} ms", report.wall_time.as_secs_f64() * 1000.0);
    println!("Avg latency:        {:.3} ms", summary.avg_ms);
    println!("Max latency:        {:.3} ms", summary.max_ms);
    println!("Latency samples:    {}", summary.sample_count);
    Ok(())
}

/// Submits every stroke, waits for all of them and reports.
pub async fn bench(
    engine: &SmoothingEngine,
    args: &BenchArgs,
    progress: Option<&ProgressBar>,
) -> BenchReport {
    let ids = StrokeIdAllocator::new();
    let strokes: Vec<Stroke> = (0..args.strokes)
        .map(|i| Stroke::new(ids.next_id(), synthetic_samples(i, args.points)))
        .collect();

    let cancel = CancellationToken::new();
    if let Some(ms) = args.cancel_after {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            cancel.cancel();
        });
    }

    let started = Instant::now();
    let mut jobs: FuturesUnordered<_> = strokes
        .iter()
        .map(|stroke| {
            let original = stroke.clone();
            let job = engine.smooth_async(stroke.clone(), None, Some(cancel.clone()));
            async move { (original, job.await) }
        })
        .collect();

    let mut unchanged = 0;
    while let Some((original, result)) = jobs.next().await {
        if result.samples == original.samples {
            unchanged += 1;
        }
        if let Some(progress) = progress {
            progress.inc(1);
        }
    }

    BenchReport {
        strokes: strokes.len(),
        unchanged,
        peak_concurrency: engine.worker_limiter().peak_in_flight(),
        wall_time: started.elapsed(),
    }
}

/// Deterministic hand-drawn-looking stroke: a wandering curve with jitter.
pub fn synthetic_samples(seed: usize, points: usize) -> Vec<Sample> {
    let phase = seed as f64 * 0.37;
    let mut x = 0.0;
    let mut y = 0.0;
    (0..points)
        .map(|i| {
            let t = i as f64;
            let heading = phase + (t * 0.03).sin() * 2.0;
            x += heading.cos() * 1.2 + jitter(seed, i, 0) * 0.3;
            y += heading.sin() * 1.2 + jitter(seed, i, 1) * 0.3;
            let pressure = 0.4 + 0.4 * ((t * 0.05 + phase).sin() * 0.5 + 0.5);
            Sample::new(x, y, pressure as f32)
        })
        .collect()
}

/// Hash-like noise in `[-1, 1]`.
fn jitter(seed: usize, index: usize, axis: usize) -> f64 {
    let n = (seed * 7919 + index * 104_729 + axis * 1_299_709) as f64;
    ((n * 12.9898).sin() * 43_758.545_3).rem_euclid(1.0) * 2.0 - 1.0
}
