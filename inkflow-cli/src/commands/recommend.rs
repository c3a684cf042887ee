//! `inkflow recommend` - print the recommended config for this machine.

use std::path::PathBuf;

use clap::Args;
use inkflow::config::write_config;
use inkflow::{quality, SmoothingConfig};

use crate::error::CliError;

/// Arguments for the recommend command.
#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Treat the data-parallel fitter as available
    #[arg(long)]
    pub hardware: bool,

    /// Use this core count instead of detecting it
    #[arg(long, value_name = "N")]
    pub cores: Option<usize>,

    /// Save the recommendation as an INI settings file
    #[arg(long, value_name = "PATH")]
    pub write: Option<PathBuf>,
}

/// Run the recommend command.
pub fn run(args: RecommendArgs) -> Result<(), CliError> {
    let cores = args.cores.unwrap_or_else(quality::available_cores);
    let config = quality::recommended_config(cores, args.hardware);

    println!("Cores detected:        {}", cores);
    print!("{}", describe(&config));

    if let Some(path) = &args.write {
        write_config(&config, path)?;
        println!();
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn describe(config: &SmoothingConfig) -> String {
    format!(
        "Quality tier:          {}\n\
         Smoothing strength:    {}\n\
         Resample interval:     {}\n\
         Interpolation steps:   {}\n\
         Curve tension:         {}\n\
         Adaptive steps:        {}\n\
         Concurrency limit:     {}\n\
         Max points per stroke: {}\n\
         Async smoothing:       {}\n\
         Parallel fitter:       {}\n",
        config.quality_tier,
        config.smoothing_strength,
        config.resample_interval,
        config.interpolation_steps,
        config.curve_tension,
        yes_no(config.adaptive_interpolation),
        config.concurrency_limit,
        config.max_points_per_stroke,
        yes_no(config.use_async),
        yes_no(config.use_hardware_acceleration),
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
