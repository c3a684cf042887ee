//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use inkflow::geometry::{BezierFitter, CurveFitter, FitParams, Interrupt};
use inkflow::{Sample, SmoothError, Stroke, StrokeId};

/// Straight line along x.
pub fn line(id: u64, count: usize, spacing: f64) -> Stroke {
    let samples = (0..count)
        .map(|i| Sample::new(i as f64 * spacing, 0.0, 0.5))
        .collect();
    Stroke::new(StrokeId::from_raw(id), samples)
}

/// Gentle arc with roughly two units between samples.
pub fn arc(id: u64, count: usize) -> Stroke {
    let samples = (0..count)
        .map(|i| {
            let t = i as f64 * 0.04;
            Sample::new(t.cos() * 50.0, t.sin() * 50.0, 0.3 + (i % 5) as f32 * 0.1)
        })
        .collect();
    Stroke::new(StrokeId::from_raw(id), samples)
}

/// Polls `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    condition()
}

/// Sleeps before fitting, polling the interrupt, and counts calls.
pub struct SlowFitter {
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl SlowFitter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CurveFitter for SlowFitter {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn fit(
        &self,
        samples: &[Sample],
        params: &FitParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Vec<Sample>, SmoothError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let until = Instant::now() + self.delay;
        while Instant::now() < until {
            interrupt.check()?;
            std::thread::sleep(Duration::from_millis(1));
        }
        BezierFitter.fit(samples, params, interrupt)
    }
}

/// Runs until interrupted, recording that it started.
pub struct BlockingFitter {
    pub started: Arc<AtomicUsize>,
}

impl BlockingFitter {
    pub fn new() -> Self {
        Self {
            started: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CurveFitter for BlockingFitter {
    fn name(&self) -> &'static str {
        "blocking"
    }

    fn fit(
        &self,
        _samples: &[Sample],
        _params: &FitParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Vec<Sample>, SmoothError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let give_up = Instant::now() + Duration::from_secs(10);
        while Instant::now() < give_up {
            interrupt.check()?;
            std::thread::sleep(Duration::from_millis(1));
        }
        Err(SmoothError::DeadlineExceeded)
    }
}

/// Blocks its first call until interrupted; later calls fit normally.
pub struct BlockOnceFitter {
    pub calls: Arc<AtomicUsize>,
}

impl BlockOnceFitter {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CurveFitter for BlockOnceFitter {
    fn name(&self) -> &'static str {
        "block-once"
    }

    fn fit(
        &self,
        samples: &[Sample],
        params: &FitParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Vec<Sample>, SmoothError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            let give_up = Instant::now() + Duration::from_secs(10);
            while Instant::now() < give_up {
                interrupt.check()?;
                std::thread::sleep(Duration::from_millis(1));
            }
            return Err(SmoothError::DeadlineExceeded);
        }
        BezierFitter.fit(samples, params, interrupt)
    }
}
