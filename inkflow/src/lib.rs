//! InkFlow - asynchronous ink smoothing
//!
//! Turns noisy, densely sampled pen strokes into smooth curves without
//! blocking the input thread and without letting point counts grow unbounded.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   smooth_async    ┌──────────────────────────────┐
//! │ input / UI   │ ────────────────► │ SmoothingEngine              │
//! │ (host)       │ ◄──── Dispatcher ─│  registry · limiter · pool   │
//! └──────────────┘                   └──────────────┬───────────────┘
//!                                                   │
//!                                     ┌─────────────▼─────────────┐
//!                                     │ geometry::SmoothingPipeline│
//!                                     │ filter relax fit resample  │
//!                                     └───────────────────────────┘
//! ```
//!
//! - [`stroke`] - samples, strokes and stroke ids
//! - [`geometry`] - pure smoothing stages
//! - [`config`] - smoothing parameters, quality tiers, INI settings
//! - [`quality`] - hardware-based config recommendation
//! - [`coordinator`] - the engine: cancellation, concurrency bound, delivery
//! - [`telemetry`] - rolling latency statistics
//! - [`logging`] - subscriber setup for binaries

pub mod config;
pub mod coordinator;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod quality;
pub mod stroke;
pub mod telemetry;

pub use config::{ConfigError, QualityTier, SmoothingConfig};
pub use coordinator::{
    dispatch_queue, CompletionCallback, DispatchQueue, Dispatcher, EngineBuilder, EngineError,
    InlineDispatcher, QueueDispatcher, SmoothingEngine, DEFAULT_SYNC_TIME_BUDGET,
};
pub use error::SmoothError;
pub use stroke::{Sample, Stroke, StrokeAttributes, StrokeId, StrokeIdAllocator};
pub use telemetry::{PerformanceMonitor, PerformanceSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
