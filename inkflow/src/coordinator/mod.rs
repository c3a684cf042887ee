//! Asynchronous smoothing coordinator.
//!
//! The [`SmoothingEngine`] accepts raw strokes, runs the geometry pipeline on
//! a dedicated worker pool under a concurrency bound, and hands the result
//! back through the caller's [`Dispatcher`].
//!
//! # Job Flow
//!
//! ```text
//! smooth_async(stroke)
//!   │  register (cancels any previous job for stroke.id)
//!   ▼
//! Queued ──── token cancelled ───────────────────────────► Cancelled
//!   │  WorkerLimiter permit
//!   ▼
//! Running ─── rayon pool: filter ► relax ► fit ► valve ► dedup ► gate
//!   │  result over oneshot
//!   ├── Err(Cancelled) ──────────────────────────────────► Cancelled
//!   ├── Err(other) / panic ──────────────────────────────► Failed
//!   ▼
//! Dispatcher::post ─ re-check token ─ on_completed(stroke) ► Completed
//! ```
//!
//! Every terminal state except `Completed` resolves to the original stroke.
//! The registry entry is removed by an RAII guard, so dropping the returned
//! future cancels the job and cleans up.
//!
//! # Configuration
//!
//! The config and its limiter live together behind one `RwLock` and are
//! replaced as a pair. Jobs take a snapshot at submission, so an update never
//! affects work already queued.

mod dispatcher;
mod error;
mod limiter;
mod registry;

pub use dispatcher::{
    dispatch_queue, CompletionCallback, DispatchQueue, DispatchTask, Dispatcher,
    InlineDispatcher, QueueDispatcher,
};
pub use error::EngineError;
pub use limiter::{WorkerLimiter, WorkerPermit};
pub use registry::{JobGuard, JobRegistry, JobState};

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, QualityTier, SmoothingConfig};
use crate::error::SmoothError;
use crate::geometry::{
    CurveFitter, Deadline, Interrupt, PipelineOutcome, SmoothingPipeline, MIN_FIT_SAMPLES,
};
use crate::quality::available_cores;
use crate::stroke::{Stroke, StrokeId};
use crate::telemetry::{PerformanceMonitor, PerformanceSummary};

/// Default time bound for [`SmoothingEngine::smooth_sync`].
pub const DEFAULT_SYNC_TIME_BUDGET: Duration = Duration::from_millis(100);

/// Config and the limiter built for it.
struct EngineState {
    config: Arc<SmoothingConfig>,
    limiter: Arc<WorkerLimiter>,
}

struct EngineInner {
    state: RwLock<EngineState>,
    registry: Arc<JobRegistry>,
    monitor: PerformanceMonitor,
    dispatcher: Arc<dyn Dispatcher>,
    fitter: Option<Arc<dyn CurveFitter>>,
    pool: rayon::ThreadPool,
    sync_time_budget: Duration,
}

/// Stroke smoothing engine.
///
/// Cheap to clone; clones share the worker pool, registry and monitor.
///
/// # Example
///
/// ```ignore
/// let engine = SmoothingEngine::new(quality::detect(false))?;
///
/// let smoothed = engine.smooth_async(stroke, None, None).await;
/// ```
#[derive(Clone)]
pub struct SmoothingEngine {
    inner: Arc<EngineInner>,
}

impl SmoothingEngine {
    /// Creates an engine with inline delivery.
    pub fn new(config: SmoothingConfig) -> Result<Self, EngineError> {
        Self::builder().config(config).build()
    }

    /// Starts building an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<SmoothingConfig> {
        Arc::clone(&self.inner.state.read().config)
    }

    /// Limiter that new jobs will acquire permits from.
    pub fn worker_limiter(&self) -> Arc<WorkerLimiter> {
        Arc::clone(&self.inner.state.read().limiter)
    }

    /// Smooths a stroke in the background.
    ///
    /// The job is registered before this returns, cancelling any job still in
    /// flight for the same stroke id. The future resolves to the smoothed
    /// stroke, or to the original when the job is cancelled, superseded or
    /// fails. `on_completed` runs through the dispatcher only for results
    /// that were actually produced.
    ///
    /// # Arguments
    ///
    /// * `stroke` - Raw stroke to smooth
    /// * `on_completed` - Optional callback receiving the result
    /// * `cancellation` - Optional caller token; cancelling it cancels the job
    pub fn smooth_async(
        &self,
        stroke: Stroke,
        on_completed: Option<CompletionCallback>,
        cancellation: Option<CancellationToken>,
    ) -> impl Future<Output = Stroke> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        let (config, limiter) = inner.snapshot();
        let job = config
            .use_async
            .then(|| inner.registry.register(stroke.id, cancellation.as_ref()));

        async move {
            match job {
                Some(job) => inner.run_job(stroke, config, limiter, job, on_completed).await,
                None => {
                    let token = cancellation.unwrap_or_else(CancellationToken::new);
                    inner
                        .run_inline_job(stroke, config, token, on_completed)
                        .await
                }
            }
        }
    }

    /// Smooths a stroke on the calling thread within the sync time budget.
    ///
    /// Returns the original stroke if smoothing fails or runs over budget.
    pub fn smooth_sync(&self, stroke: &Stroke) -> Stroke {
        let config = self.config();
        let started = Instant::now();
        match self.inner.smooth_inline(stroke, &config, None) {
            Ok(outcome) => {
                let elapsed = started.elapsed();
                self.inner.monitor.record(elapsed);
                debug!(
                    stroke_id = %stroke.id,
                    points = outcome.samples.len(),
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Smoothed inline"
                );
                stroke.with_samples(outcome.samples)
            }
            Err(e) => {
                log_abandoned(stroke.id, &e);
                stroke.clone()
            }
        }
    }

    /// Cancels every in-flight job. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.inner.registry.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "Cancelled all smoothing jobs");
        }
        cancelled
    }

    /// Replaces the configuration.
    ///
    /// The new config is validated first; on error the current one stays
    /// active. A changed concurrency limit applies to jobs submitted after
    /// this call.
    pub fn update_config(&self, config: SmoothingConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Rejected smoothing configuration");
            return Err(e);
        }

        let mut state = self.inner.state.write();
        if config.concurrency_limit != state.limiter.max_concurrent() {
            state.limiter = Arc::new(WorkerLimiter::new(config.concurrency_limit));
        }
        info!(
            tier = %config.quality_tier,
            concurrency = config.concurrency_limit,
            use_async = config.use_async,
            hardware = config.use_hardware_acceleration,
            "Smoothing configuration updated"
        );
        state.config = Arc::new(config);
        Ok(())
    }

    /// Switches to a quality tier, keeping non-tier preferences.
    pub fn set_quality_tier(&self, tier: QualityTier) -> Result<(), ConfigError> {
        let next = self.config().with_tier(tier);
        self.update_config(next)
    }

    /// Latency statistics for completed jobs.
    pub fn performance_summary(&self) -> PerformanceSummary {
        self.inner.monitor.summary()
    }

    /// Clears recorded latency statistics.
    pub fn reset_performance(&self) {
        self.inner.monitor.reset();
    }

    /// Number of registered jobs.
    pub fn in_flight(&self) -> usize {
        self.inner.registry.len()
    }

    /// Returns true if a job is registered for `stroke_id`.
    pub fn is_in_flight(&self, stroke_id: StrokeId) -> bool {
        self.inner.registry.contains(stroke_id)
    }
}

impl fmt::Debug for SmoothingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothingEngine")
            .field("config", &self.config())
            .field("in_flight", &self.in_flight())
            .field("workers", &self.inner.pool.current_num_threads())
            .finish()
    }
}

impl EngineInner {
    fn snapshot(&self) -> (Arc<SmoothingConfig>, Arc<WorkerLimiter>) {
        let state = self.state.read();
        (Arc::clone(&state.config), Arc::clone(&state.limiter))
    }

    fn pipeline_for(&self, config: &SmoothingConfig) -> SmoothingPipeline {
        match &self.fitter {
            Some(fitter) => SmoothingPipeline::new(Arc::clone(fitter)),
            None => SmoothingPipeline::for_config(config),
        }
    }

    async fn run_job(
        self: Arc<Self>,
        stroke: Stroke,
        config: Arc<SmoothingConfig>,
        limiter: Arc<WorkerLimiter>,
        job: JobGuard,
        on_completed: Option<CompletionCallback>,
    ) -> Stroke {
        let stroke_id = stroke.id;
        let token = job.token().clone();
        log_state(stroke_id, JobState::Queued);

        if stroke.len() < MIN_FIT_SAMPLES {
            return self
                .pass_through(stroke, Instant::now(), &token, on_completed)
                .await;
        }

        let permit = tokio::select! {
            biased;

            _ = token.cancelled() => {
                log_state(stroke_id, JobState::Cancelled);
                return stroke;
            }

            permit = limiter.acquire() => permit,
        };
        let Some(permit) = permit else {
            log_abandoned(stroke_id, &SmoothError::WorkerLost);
            return stroke;
        };

        log_state(stroke_id, JobState::Running);
        let started = Instant::now();
        match self.compute(&stroke, config, token.clone(), permit).await {
            Ok(outcome) => {
                let smoothed = stroke.with_samples(outcome.samples);
                self.finish(stroke, smoothed, started, &token, on_completed)
                    .await
            }
            Err(e) => {
                log_abandoned(stroke_id, &e);
                stroke
            }
        }
    }

    async fn run_inline_job(
        self: Arc<Self>,
        stroke: Stroke,
        config: Arc<SmoothingConfig>,
        token: CancellationToken,
        on_completed: Option<CompletionCallback>,
    ) -> Stroke {
        let started = Instant::now();
        if stroke.len() < MIN_FIT_SAMPLES {
            return self
                .pass_through(stroke, started, &token, on_completed)
                .await;
        }

        match self.smooth_inline(&stroke, &config, Some(&token)) {
            Ok(outcome) => {
                let smoothed = stroke.with_samples(outcome.samples);
                self.finish(stroke, smoothed, started, &token, on_completed)
                    .await
            }
            Err(e) => {
                log_abandoned(stroke.id, &e);
                stroke
            }
        }
    }

    /// Runs the pipeline on the worker pool. The permit is released before
    /// the result is sent, and only once the worker stops, even if this
    /// future resolves first on cancellation.
    async fn compute(
        &self,
        stroke: &Stroke,
        config: Arc<SmoothingConfig>,
        token: CancellationToken,
        permit: WorkerPermit,
    ) -> Result<PipelineOutcome, SmoothError> {
        let (tx, rx) = oneshot::channel();
        let samples = stroke.samples.clone();
        let pipeline = self.pipeline_for(&config);
        let worker_token = token.clone();

        self.pool.spawn(move || {
            let result = run_guarded(|| pipeline.run(&samples, &config, &worker_token));
            drop(permit);
            let _ = tx.send(result);
        });

        tokio::select! {
            biased;

            result = rx => result.unwrap_or(Err(SmoothError::WorkerLost)),

            _ = token.cancelled() => Err(SmoothError::Cancelled),
        }
    }

    fn smooth_inline(
        &self,
        stroke: &Stroke,
        config: &SmoothingConfig,
        token: Option<&CancellationToken>,
    ) -> Result<PipelineOutcome, SmoothError> {
        let interrupt = InlineInterrupt {
            deadline: Deadline::after(self.sync_time_budget),
            token,
        };
        let pipeline = self.pipeline_for(config);
        let outcome = run_guarded(|| pipeline.run(&stroke.samples, config, &interrupt))?;

        if interrupt.deadline.is_expired() {
            return Err(SmoothError::DeadlineExceeded);
        }
        Ok(outcome)
    }

    async fn pass_through(
        &self,
        stroke: Stroke,
        started: Instant,
        token: &CancellationToken,
        on_completed: Option<CompletionCallback>,
    ) -> Stroke {
        debug!(
            stroke_id = %stroke.id,
            points = stroke.len(),
            "Too few samples to smooth, passing through"
        );
        let unchanged = stroke.clone();
        self.finish(stroke, unchanged, started, token, on_completed)
            .await
    }

    /// Delivers `smoothed`, records timing and returns it; falls back to
    /// `original` if the job was cancelled before delivery.
    async fn finish(
        &self,
        original: Stroke,
        smoothed: Stroke,
        started: Instant,
        token: &CancellationToken,
        on_completed: Option<CompletionCallback>,
    ) -> Stroke {
        if !self.deliver(&smoothed, on_completed, token).await {
            log_state(original.id, JobState::Cancelled);
            return original;
        }

        let elapsed = started.elapsed();
        self.monitor.record(elapsed);
        debug!(
            stroke_id = %smoothed.id,
            state = %JobState::Completed,
            input = original.len(),
            points = smoothed.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Job state changed"
        );
        smoothed
    }

    /// Posts the callback and waits for it to run.
    ///
    /// Returns false if the job was cancelled first. The posted task checks
    /// the token again right before calling back.
    async fn deliver(
        &self,
        stroke: &Stroke,
        on_completed: Option<CompletionCallback>,
        token: &CancellationToken,
    ) -> bool {
        let Some(callback) = on_completed else {
            return !token.is_cancelled();
        };

        let (tx, rx) = oneshot::channel();
        let check = token.clone();
        let result = stroke.clone();
        self.dispatcher.post(Box::new(move || {
            let delivered = !check.is_cancelled();
            if delivered {
                callback(result);
            }
            let _ = tx.send(delivered);
        }));

        tokio::select! {
            biased;

            delivered = rx => match delivered {
                Ok(delivered) => delivered,
                Err(_) => {
                    warn!(stroke_id = %stroke.id, "Dispatcher dropped completion callback");
                    !token.is_cancelled()
                }
            },

            _ = token.cancelled() => false,
        }
    }
}

/// Builder for [`SmoothingEngine`].
pub struct EngineBuilder {
    config: SmoothingConfig,
    dispatcher: Arc<dyn Dispatcher>,
    fitter: Option<Arc<dyn CurveFitter>>,
    sync_time_budget: Duration,
    worker_threads: Option<usize>,
}

impl EngineBuilder {
    /// Default config, inline dispatcher, default sync budget.
    pub fn new() -> Self {
        Self {
            config: SmoothingConfig::default(),
            dispatcher: Arc::new(InlineDispatcher),
            fitter: None,
            sync_time_budget: DEFAULT_SYNC_TIME_BUDGET,
            worker_threads: None,
        }
    }

    /// Set the initial configuration.
    pub fn config(mut self, config: SmoothingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the dispatcher used for completion callbacks.
    pub fn dispatcher(mut self, dispatcher: impl Dispatcher + 'static) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    /// Use a specific fitter instead of selecting one from the config.
    pub fn fitter(mut self, fitter: Arc<dyn CurveFitter>) -> Self {
        self.fitter = Some(fitter);
        self
    }

    /// Set the time bound for inline smoothing.
    pub fn sync_time_budget(mut self, budget: Duration) -> Self {
        self.sync_time_budget = budget;
        self
    }

    /// Set the worker pool size. Defaults to the larger of the concurrency
    /// limit and the number of cores.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Validates the config and starts the worker pool.
    pub fn build(self) -> Result<SmoothingEngine, EngineError> {
        self.config.validate()?;

        let threads = self
            .worker_threads
            .unwrap_or_else(|| self.config.concurrency_limit.max(available_cores()))
            .max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("inkflow-worker-{}", index))
            .build()?;

        info!(
            tier = %self.config.quality_tier,
            concurrency = self.config.concurrency_limit,
            workers = threads,
            use_async = self.config.use_async,
            hardware = self.config.use_hardware_acceleration,
            "Smoothing engine started"
        );

        let limiter = Arc::new(WorkerLimiter::new(self.config.concurrency_limit));
        Ok(SmoothingEngine {
            inner: Arc::new(EngineInner {
                state: RwLock::new(EngineState {
                    config: Arc::new(self.config),
                    limiter,
                }),
                registry: Arc::new(JobRegistry::new()),
                monitor: PerformanceMonitor::new(),
                dispatcher: self.dispatcher,
                fitter: self.fitter,
                pool,
                sync_time_budget: self.sync_time_budget,
            }),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deadline plus optional caller token.
struct InlineInterrupt<'a> {
    deadline: Deadline,
    token: Option<&'a CancellationToken>,
}

impl Interrupt for InlineInterrupt<'_> {
    fn check(&self) -> Result<(), SmoothError> {
        if let Some(token) = self.token {
            token.check()?;
        }
        self.deadline.check()
    }
}

/// Runs a pipeline closure, turning a panic into an error.
fn run_guarded<F>(run: F) -> Result<PipelineOutcome, SmoothError>
where
    F: FnOnce() -> Result<PipelineOutcome, SmoothError>,
{
    panic::catch_unwind(AssertUnwindSafe(run))
        .unwrap_or_else(|payload| Err(SmoothError::WorkerPanicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_state(stroke_id: StrokeId, state: JobState) {
    debug!(stroke_id = %stroke_id, state = %state, "Job state changed");
}

/// Logs why a job returned the original stroke.
fn log_abandoned(stroke_id: StrokeId, error: &SmoothError) {
    match error {
        SmoothError::InsufficientInput { .. } => {
            debug!(stroke_id = %stroke_id, reason = %error, "Passing stroke through unchanged");
        }
        e if e.is_expected() => {
            debug!(
                stroke_id = %stroke_id,
                state = %JobState::Cancelled,
                reason = %e,
                "Smoothing abandoned, keeping original"
            );
        }
        e => {
            error!(
                stroke_id = %stroke_id,
                state = %JobState::Failed,
                error = %e,
                "Smoothing failed, keeping original"
            );
        }
    }
}
