//! Per-stroke job registry.
//!
//! At most one live job exists per [`StrokeId`]. Registering a job replaces
//! the previous entry inside a single `DashMap::insert` (under the shard
//! lock) and cancels the displaced token, so two racing submissions can never
//! both believe they are current.
//!
//! Entries carry a generation number. A finished job only removes the entry
//! if it still holds its own generation; a job that was superseded leaves its
//! successor alone.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::stroke::StrokeId;

/// Lifecycle of a smoothing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// No job registered for the stroke.
    Idle,
    /// Registered, waiting for a worker slot.
    Queued,
    /// Holding a slot, geometry running.
    Running,
    /// Result delivered.
    Completed,
    /// Cancelled or superseded; original returned.
    Cancelled,
    /// Pipeline error or worker panic; original returned.
    Failed,
}

impl JobState {
    /// Returns true for states a job never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Idle => write!(f, "idle"),
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Completed => write!(f, "completed"),
            JobState::Cancelled => write!(f, "cancelled"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
struct JobEntry {
    generation: u64,
    token: CancellationToken,
}

/// Map of live jobs keyed by stroke id.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<StrokeId, JobEntry>,
    next_generation: AtomicU64,
}

impl JobRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job for `stroke_id`, cancelling any previous one.
    ///
    /// When `parent` is given the job token is its child, so cancelling the
    /// parent cancels the job.
    pub fn register(
        self: &Arc<Self>,
        stroke_id: StrokeId,
        parent: Option<&CancellationToken>,
    ) -> JobGuard {
        let token = parent
            .map(CancellationToken::child_token)
            .unwrap_or_else(CancellationToken::new);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let previous = self.jobs.insert(
            stroke_id,
            JobEntry {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            debug!(
                stroke_id = %stroke_id,
                superseded = previous.generation,
                generation,
                "Superseded in-flight job"
            );
        }

        JobGuard {
            registry: Arc::clone(self),
            stroke_id,
            generation,
            token,
        }
    }

    /// Cancels every registered job. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for entry in self.jobs.iter() {
            entry.value().token.cancel();
            cancelled += 1;
        }
        cancelled
    }

    /// Returns true if a job is registered for `stroke_id`.
    pub fn contains(&self, stroke_id: StrokeId) -> bool {
        self.jobs.contains_key(&stroke_id)
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn release(&self, stroke_id: StrokeId, generation: u64) {
        self.jobs
            .remove_if(&stroke_id, |_, entry| entry.generation == generation);
    }
}

/// Ownership of one registered job.
///
/// Dropping the guard cancels the job token and removes the registry entry
/// if it still belongs to this generation.
#[derive(Debug)]
pub struct JobGuard {
    registry: Arc<JobRegistry>,
    stroke_id: StrokeId,
    generation: u64,
    token: CancellationToken,
}

impl JobGuard {
    /// The job's cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stroke this job smooths.
    pub fn stroke_id(&self) -> StrokeId {
        self.stroke_id
    }

    /// Registration generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once the job has been cancelled or superseded.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.token.cancel();
        self.registry.release(self.stroke_id, self.generation);
    }
}
