//! Category-bound worker threads.
//!
//! Each worker loops fetching the next eligible task from its category's
//! queue, records queue-wait telemetry, runs the task and hands the result
//! back to the pool. Workers exit when their stop flag is raised; a worker
//! retired by a downward resize finishes its current task first and exits
//! on its next fetch.

use super::kind::Category;
use super::pool::PoolShared;
use super::queue::TaskQueue;
use super::task::{ScheduledTask, TaskContext};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Handle to a spawned worker: its stop flag and join handle.
pub(crate) struct WorkerHandle {
    name: String,
    stop: Arc<AtomicBool>,
    join: thread::JoinHandle<()>,
}

impl WorkerHandle {
    /// Asks the worker to exit at its next fetch.
    pub(crate) fn signal_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Joins the worker thread; call only after `signal_stop` and a queue
    /// notification, with no pool locks held.
    pub(crate) fn join(self) {
        if self.join.join().is_err() {
            warn!(worker = %self.name, "worker thread terminated abnormally");
        }
    }
}

/// Spawns a worker bound to `queue`.
pub(crate) fn spawn_worker(
    category: Category,
    index: usize,
    queue: Arc<TaskQueue>,
    shared: Arc<PoolShared>,
) -> WorkerHandle {
    let name = format!("{}_worker_{}", category, index);
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let thread_name = name.clone();
    let join = thread::Builder::new()
        .name(name.clone())
        .spawn(move || worker_loop(&thread_name, queue, shared, thread_stop))
        .expect("failed to spawn executor worker thread");
    WorkerHandle { name, stop, join }
}

fn worker_loop(
    name: &str,
    queue: Arc<TaskQueue>,
    shared: Arc<PoolShared>,
    stop: Arc<AtomicBool>,
) {
    debug!(worker = name, queue = queue.name(), "worker started");
    while let Some(task) = queue.fetch_next_task(&stop) {
        if task.is_dead() {
            shared.erase_task(&task);
            continue;
        }
        process_task(&shared, &task);
    }
    debug!(worker = name, "worker exiting");
}

/// Runs one fetched task: telemetry, execution, completion.
///
/// Shared between worker threads and the pool's single-threaded driver so
/// both dispatch paths behave identically.
pub(crate) fn process_task(shared: &PoolShared, task: &Arc<ScheduledTask>) {
    let clock = shared.clock();
    let fetched_at = clock.now();
    let q_time = fetched_at.saturating_duration_since(task.waketime());
    task.owner().log_q_time(task.kind(), q_time);

    task.set_running();
    let ctx = TaskContext::new(task, clock.as_ref());
    let reschedule = catch_unwind(AssertUnwindSafe(|| task.execute(&ctx))).unwrap_or_else(|_| {
        warn!(
            task = task.id(),
            kind = %task.kind(),
            description = %task.description(),
            "task panicked; treating as non-reschedule"
        );
        false
    });
    let run_time = clock.now().saturating_duration_since(fetched_at);
    task.owner().log_run_time(task.kind(), run_time);

    shared.done_task(task, reschedule);
}
