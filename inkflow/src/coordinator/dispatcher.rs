//! Delivery of completed strokes to the caller's execution context.
//!
//! The engine never calls a completion callback directly from a worker. It
//! posts a task to the [`Dispatcher`] supplied at construction; the host
//! decides where that task runs.
//!
//! ```text
//! worker ─► engine ─► Dispatcher::post(task) ─► [host context] task()
//!                                                   └─► on_completed(stroke)
//! ```

use tokio::sync::mpsc;

use crate::stroke::Stroke;

/// Callback receiving the smoothed stroke.
pub type CompletionCallback = Box<dyn FnOnce(Stroke) + Send + 'static>;

/// Unit of work posted to a dispatcher.
pub type DispatchTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs posted tasks on some execution context.
pub trait Dispatcher: Send + Sync {
    /// Schedules `task`. Dropping the task instead of running it is allowed;
    /// the engine treats that as delivery without a callback.
    fn post(&self, task: DispatchTask);
}

/// Runs tasks immediately on the posting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn post(&self, task: DispatchTask) {
        task();
    }
}

/// Sends tasks to a [`DispatchQueue`] drained by the host.
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    tx: mpsc::UnboundedSender<DispatchTask>,
}

impl Dispatcher for QueueDispatcher {
    fn post(&self, task: DispatchTask) {
        // A closed queue drops the task.
        let _ = self.tx.send(task);
    }
}

/// Receiving end of a [`QueueDispatcher`].
///
/// Typically owned by a UI loop that calls [`run_pending`](Self::run_pending)
/// once per frame.
#[derive(Debug)]
pub struct DispatchQueue {
    rx: mpsc::UnboundedReceiver<DispatchTask>,
}

impl DispatchQueue {
    /// Runs every task queued so far. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits for the next task and runs it.
    ///
    /// Returns false once every dispatcher has been dropped.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

/// Creates a connected dispatcher and queue.
pub fn dispatch_queue() -> (QueueDispatcher, DispatchQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueDispatcher { tx }, DispatchQueue { rx })
}
