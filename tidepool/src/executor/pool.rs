//! The executor pool.
//!
//! Process-wide composition root for background execution: owns the four
//! category queues, sizes and spawns the worker groups, registers tenants,
//! routes schedule/wake/snooze/cancel by task id and drives per-tenant and
//! global shutdown.
//!
//! The pool is installable as a process singleton via
//! [`ExecutorPool::install`] / [`ExecutorPool::global`] /
//! [`ExecutorPool::reset`], so tests can swap in a differently-configured
//! pool (including a zero-worker pool driven by
//! [`ExecutorPool::run_next_task`]) before any tenant registers.

use super::kind::Category;
use super::queue::{TaskQueue, MIN_SLEEP_TIME};
use super::task::{ScheduledTask, TaskId};
use super::taskable::{Taskable, TaskableId};
use super::worker::{self, WorkerHandle};
use crate::config::{ConfigError, Configuration, ValueChangedListener};
use crate::time::{Clock, SystemClock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by pool operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutorError {
    /// Schedule or unregister against a tenant the pool does not know.
    #[error("taskable {0} is not registered with the executor pool")]
    UnknownTaskable(TaskableId),

    /// Operation arrived after `shutdown()`.
    #[error("executor pool is shut down")]
    PoolShutdown,
}

/// Construction parameters for an [`ExecutorPool`].
///
/// A zero cap means "derive from `max_threads`" using the calibrated
/// per-category formulas.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Overall thread budget the category formulas scale against.
    pub max_threads: usize,
    pub max_readers: usize,
    pub max_writers: usize,
    pub max_aux_io: usize,
    pub max_non_io: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            max_readers: 0,
            max_writers: 0,
            max_aux_io: 0,
            max_non_io: 0,
        }
    }
}

impl PoolConfig {
    /// Reads the pool sizing keys from the configuration registry.
    ///
    /// `max_threads = 0` in the registry falls back to the machine's
    /// available parallelism, matching [`PoolConfig::default`].
    pub fn from_configuration(config: &Configuration) -> Result<Self, ConfigError> {
        let max_threads = config.get_integer("max_threads")? as usize;
        Ok(Self {
            max_threads: if max_threads == 0 {
                PoolConfig::default().max_threads
            } else {
                max_threads
            },
            max_readers: config.get_integer("max_num_readers")? as usize,
            max_writers: config.get_integer("max_num_writers")? as usize,
            max_aux_io: config.get_integer("max_num_auxio")? as usize,
            max_non_io: config.get_integer("max_num_nonio")? as usize,
        })
    }

    /// Derives the per-category worker counts for this configuration.
    pub fn thread_counts(&self) -> ThreadCounts {
        ThreadCounts::derive(
            self.max_threads,
            self.max_readers,
            self.max_writers,
            self.max_aux_io,
            self.max_non_io,
        )
    }
}

/// Worker counts per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadCounts {
    pub readers: usize,
    pub writers: usize,
    pub aux_io: usize,
    pub non_io: usize,
}

impl ThreadCounts {
    /// Derives counts from the thread budget, honoring non-zero caps.
    ///
    /// Writers are fixed; AuxIO and NonIO scale sublinearly with the
    /// budget; readers take most of whatever budget remains. The constants
    /// are calibrated - changing them changes dispatch behavior on every
    /// deployment size.
    pub fn derive(
        max_threads: usize,
        max_readers: usize,
        max_writers: usize,
        max_aux_io: usize,
        max_non_io: usize,
    ) -> Self {
        let writers = if max_writers != 0 { max_writers } else { 4 };
        let aux_io = if max_aux_io != 0 {
            max_aux_io
        } else {
            max_threads.div_ceil(10).clamp(1, 8)
        };
        let non_io = if max_non_io != 0 {
            max_non_io
        } else {
            (max_threads * 3 / 10).clamp(2, 8)
        };
        let readers = if max_readers != 0 {
            max_readers
        } else {
            let spare = max_threads.saturating_sub(writers + aux_io + non_io);
            // ceil(0.7 * spare)
            ((spare * 7).div_ceil(10)).clamp(4, 12)
        };
        Self {
            readers,
            writers,
            aux_io,
            non_io,
        }
    }

    /// All-zero counts: a pool that spawns no workers and is driven
    /// manually via [`ExecutorPool::run_next_task`].
    pub fn none() -> Self {
        Self {
            readers: 0,
            writers: 0,
            aux_io: 0,
            non_io: 0,
        }
    }

    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Reader => self.readers,
            Category::Writer => self.writers,
            Category::AuxIo => self.aux_io,
            Category::NonIo => self.non_io,
        }
    }

    fn set(&mut self, category: Category, count: usize) {
        match category {
            Category::Reader => self.readers = count,
            Category::Writer => self.writers = count,
            Category::AuxIo => self.aux_io = count,
            Category::NonIo => self.non_io = count,
        }
    }

    pub fn total(&self) -> usize {
        self.readers + self.writers + self.aux_io + self.non_io
    }
}

struct Registry {
    taskables: HashMap<TaskableId, Arc<dyn Taskable>>,
    locator: HashMap<TaskId, (Arc<ScheduledTask>, Category)>,
    workers: [Vec<WorkerHandle>; Category::COUNT],
    desired: ThreadCounts,
    shutdown: bool,
}

/// State shared between the pool facade and its worker threads.
pub(crate) struct PoolShared {
    clock: Arc<dyn Clock>,
    queues: [Arc<TaskQueue>; Category::COUNT],
    tot_ready: Arc<AtomicUsize>,
    registry: Mutex<Registry>,
    /// Signalled whenever a task leaves the locator; `stop_task_group`
    /// waits on this for its drain loop.
    task_drained: Condvar,
    worker_seq: AtomicUsize,
}

impl PoolShared {
    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Disposes of a dead task a worker pulled from a queue.
    pub(crate) fn erase_task(&self, task: &Arc<ScheduledTask>) {
        let mut registry = self.registry.lock().unwrap();
        registry.locator.remove(&task.id());
        drop(registry);
        self.task_drained.notify_all();
    }

    /// Completes one dispatch: reschedule on `true`, retire on `false`.
    pub(crate) fn done_task(&self, task: &Arc<ScheduledTask>, reschedule: bool) {
        let requeue_to = {
            let mut registry = self.registry.lock().unwrap();
            let located = registry.locator.get(&task.id()).map(|(_, category)| *category);
            match located {
                Some(category) if reschedule && !task.is_dead() => Some(category),
                Some(_) => {
                    registry.locator.remove(&task.id());
                    task.cancel();
                    None
                }
                // Already erased by a concurrent cancel path.
                None => {
                    task.cancel();
                    None
                }
            }
        };
        match requeue_to {
            Some(category) => {
                task.make_runnable();
                self.queues[category.index()].reschedule(task);
            }
            None => self.task_drained.notify_all(),
        }
    }
}

/// The process-wide executor pool.
pub struct ExecutorPool {
    shared: Arc<PoolShared>,
}

static GLOBAL_POOL: Mutex<Option<Arc<ExecutorPool>>> = Mutex::new(None);

impl ExecutorPool {
    /// Creates a pool on the system clock.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a pool with an injected clock (virtual time in tests).
    pub fn with_clock(config: PoolConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_thread_counts(config.thread_counts(), clock)
    }

    /// Creates a pool with explicit worker counts.
    ///
    /// This is the replacement seam for tests: [`ThreadCounts::none`]
    /// yields a pool with no worker threads, driven synchronously through
    /// [`ExecutorPool::run_next_task`].
    pub fn with_thread_counts(counts: ThreadCounts, clock: Arc<dyn Clock>) -> Self {
        let tot_ready = Arc::new(AtomicUsize::new(0));
        let queues = Category::ALL.map(|category| {
            Arc::new(TaskQueue::new(
                category,
                Arc::clone(&clock),
                Arc::clone(&tot_ready),
            ))
        });
        let shared = Arc::new(PoolShared {
            clock,
            queues,
            tot_ready,
            registry: Mutex::new(Registry {
                taskables: HashMap::new(),
                locator: HashMap::new(),
                workers: std::array::from_fn(|_| Vec::new()),
                desired: counts,
                shutdown: false,
            }),
            task_drained: Condvar::new(),
            worker_seq: AtomicUsize::new(0),
        });
        Self { shared }
    }

    /// Installs `pool` as the process-wide instance.
    pub fn install(pool: Arc<ExecutorPool>) {
        *GLOBAL_POOL.lock().unwrap() = Some(pool);
    }

    /// The installed process-wide instance, if any.
    pub fn global() -> Option<Arc<ExecutorPool>> {
        GLOBAL_POOL.lock().unwrap().clone()
    }

    /// Removes and returns the installed instance; the caller decides
    /// whether to `shutdown()` it.
    pub fn reset() -> Option<Arc<ExecutorPool>> {
        GLOBAL_POOL.lock().unwrap().take()
    }

    /// Registers a tenant.
    ///
    /// The first registration lazily spawns all worker groups; later ones
    /// only add the tenant.
    pub fn register_taskable(&self, taskable: Arc<dyn Taskable>) -> Result<(), ExecutorError> {
        let mut registry = self.shared.registry.lock().unwrap();
        if registry.shutdown {
            return Err(ExecutorError::PoolShutdown);
        }
        let first = registry.taskables.is_empty();
        info!(
            taskable = taskable.name(),
            gid = taskable.gid(),
            policy = ?taskable.workload_policy(),
            "registering taskable"
        );
        registry.taskables.insert(taskable.gid(), taskable);
        if first {
            self.spawn_workers(&mut registry);
        }
        Ok(())
    }

    /// Unregisters a tenant, draining its tasks first.
    ///
    /// With `force`, outstanding tasks are cancelled outright; otherwise
    /// tasks flagged `complete_before_shutdown` are run to completion. When
    /// the last tenant leaves, all workers are joined.
    pub fn unregister_taskable(
        &self,
        taskable: &dyn Taskable,
        force: bool,
    ) -> Result<(), ExecutorError> {
        let gid = taskable.gid();
        {
            let mut registry = self.shared.registry.lock().unwrap();
            if registry.taskables.remove(&gid).is_none() {
                return Err(ExecutorError::UnknownTaskable(gid));
            }
        }
        info!(taskable = taskable.name(), gid, force, "unregistering taskable");
        self.stop_task_group_inner(gid, None, force);

        let retiring = {
            let mut registry = self.shared.registry.lock().unwrap();
            if registry.taskables.is_empty() {
                self.drain_all_workers(&mut registry)
            } else {
                Vec::new()
            }
        };
        self.retire(retiring);
        Ok(())
    }

    /// Schedules a task onto `category`'s queue.
    ///
    /// The task becomes eligible at `now + sleep` on the pool clock.
    /// Returns the task id used for wake/snooze/cancel.
    pub fn schedule(
        &self,
        task: ScheduledTask,
        category: Category,
    ) -> Result<TaskId, ExecutorError> {
        let task = Arc::new(task);
        {
            let mut registry = self.shared.registry.lock().unwrap();
            if registry.shutdown {
                return Err(ExecutorError::PoolShutdown);
            }
            if !registry.taskables.contains_key(&task.gid()) {
                return Err(ExecutorError::UnknownTaskable(task.gid()));
            }
            registry
                .locator
                .insert(task.id(), (Arc::clone(&task), category));
        }
        task.set_waketime(self.shared.clock.now() + task.initial_sleep());
        self.shared.queues[category.index()].schedule(&task);
        Ok(task.id())
    }

    /// Makes a task due now. Returns whether the id was known.
    pub fn wake(&self, task_id: TaskId) -> bool {
        match self.find(task_id) {
            Some((task, category)) => {
                self.shared.queues[category.index()].wake(&task);
                true
            }
            None => false,
        }
    }

    /// Pushes a task's waketime to `now + sleep`. Returns whether the id
    /// was known.
    pub fn snooze(&self, task_id: TaskId, sleep: Duration) -> bool {
        match self.find(task_id) {
            Some((task, category)) => {
                self.shared.queues[category.index()].snooze(&task, sleep);
                true
            }
            None => false,
        }
    }

    /// Marks a task dead; non-blocking.
    ///
    /// The task may still run once if a worker already fetched it. Queued
    /// copies are woken so a worker disposes of them promptly.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        match self.find(task_id) {
            Some((task, category)) => {
                task.cancel();
                self.shared.queues[category.index()].wake(&task);
                true
            }
            None => false,
        }
    }

    /// Cancels every task; workers drain the queues as they go.
    pub fn cancel_all(&self) {
        let tasks: Vec<(Arc<ScheduledTask>, Category)> = {
            let registry = self.shared.registry.lock().unwrap();
            registry.locator.values().cloned().collect()
        };
        for (task, category) in tasks {
            task.cancel();
            self.shared.queues[category.index()].wake(&task);
        }
    }

    /// Cancels every task and empties the queues synchronously.
    ///
    /// Tasks currently inside `run()` stay in the locator until their
    /// worker completes them.
    pub fn cancel_and_clear_all(&self) {
        self.cancel_all();
        let mut drained = Vec::new();
        for queue in &self.shared.queues {
            drained.extend(queue.clear());
        }
        {
            let mut registry = self.shared.registry.lock().unwrap();
            for task in &drained {
                registry.locator.remove(&task.id());
            }
        }
        self.shared.task_drained.notify_all();
    }

    /// Drains one (tenant, category) slice, blocking until every matching
    /// task has left the pool - including tasks currently mid-`run()`.
    ///
    /// With `force` every matching task is cancelled; otherwise tasks
    /// flagged `complete_before_shutdown` are woken and allowed to finish.
    /// `category = None` covers all four categories. Returns whether any
    /// task had to be stopped.
    pub fn stop_task_group(
        &self,
        gid: TaskableId,
        category: Option<Category>,
        force: bool,
    ) -> bool {
        self.stop_task_group_inner(gid, category, force)
    }

    /// Runs the next eligible task of `category` on the calling thread.
    ///
    /// Single-threaded driver for zero-worker pools: fetches, disposes of
    /// dead tasks, executes one live task through the same path workers use
    /// and returns it (`None` when nothing is eligible).
    pub fn run_next_task(&self, category: Category) -> Option<Arc<ScheduledTask>> {
        let queue = &self.shared.queues[category.index()];
        loop {
            let task = queue.try_fetch_next_task()?;
            if task.is_dead() {
                self.shared.erase_task(&task);
                continue;
            }
            worker::process_task(&self.shared, &task);
            return Some(task);
        }
    }

    /// Resizes the reader group; returns once the count matches.
    pub fn set_max_readers(&self, count: usize) {
        self.resize(Category::Reader, count);
    }

    /// Resizes the writer group; returns once the count matches.
    pub fn set_max_writers(&self, count: usize) {
        self.resize(Category::Writer, count);
    }

    /// Resizes the auxiliary I/O group; returns once the count matches.
    pub fn set_max_aux_io(&self, count: usize) {
        self.resize(Category::AuxIo, count);
    }

    /// Resizes the non-I/O group; returns once the count matches.
    pub fn set_max_non_io(&self, count: usize) {
        self.resize(Category::NonIo, count);
    }

    pub fn num_readers(&self) -> usize {
        self.worker_count(Category::Reader)
    }

    pub fn num_writers(&self) -> usize {
        self.worker_count(Category::Writer)
    }

    pub fn num_aux_io(&self) -> usize {
        self.worker_count(Category::AuxIo)
    }

    pub fn num_non_io(&self) -> usize {
        self.worker_count(Category::NonIo)
    }

    /// Total spawned worker threads.
    pub fn num_workers(&self) -> usize {
        let registry = self.shared.registry.lock().unwrap();
        registry.workers.iter().map(Vec::len).sum()
    }

    /// Registered tenant count.
    pub fn num_buckets(&self) -> usize {
        self.shared.registry.lock().unwrap().taskables.len()
    }

    /// Ready tasks in one category.
    pub fn num_ready_tasks(&self, category: Category) -> usize {
        self.shared.queues[category.index()].num_ready()
    }

    /// Ready tasks across all categories; always equals the per-category
    /// sum.
    pub fn tot_ready_tasks(&self) -> usize {
        self.shared.tot_ready.load(Ordering::SeqCst)
    }

    /// The queue backing `category`, exposed for stats and drivers.
    pub fn task_queue(&self, category: Category) -> Arc<TaskQueue> {
        Arc::clone(&self.shared.queues[category.index()])
    }

    /// Global shutdown: drains `complete_before_shutdown` tasks, cancels
    /// the rest, unregisters every tenant and joins all workers. Later
    /// schedules fail with [`ExecutorError::PoolShutdown`].
    pub fn shutdown(&self) {
        let gids: Vec<TaskableId> = {
            let mut registry = self.shared.registry.lock().unwrap();
            registry.shutdown = true;
            registry.taskables.keys().copied().collect()
        };
        info!(buckets = gids.len(), "executor pool shutting down");

        if self.num_workers() == 0 {
            // Nothing will drain the queues; clear them synchronously.
            self.cancel_and_clear_all();
        } else {
            for gid in &gids {
                self.stop_task_group_inner(*gid, None, false);
            }
        }

        let retiring = {
            let mut registry = self.shared.registry.lock().unwrap();
            registry.taskables.clear();
            self.drain_all_workers(&mut registry)
        };
        self.retire(retiring);
    }

    fn find(&self, task_id: TaskId) -> Option<(Arc<ScheduledTask>, Category)> {
        let registry = self.shared.registry.lock().unwrap();
        registry.locator.get(&task_id).cloned()
    }

    fn worker_count(&self, category: Category) -> usize {
        let registry = self.shared.registry.lock().unwrap();
        registry.workers[category.index()].len()
    }

    /// Spawns all worker groups at their desired sizes. Registry lock held
    /// by the caller.
    fn spawn_workers(&self, registry: &mut Registry) {
        for category in Category::ALL {
            let target = registry.desired.get(category);
            for _ in 0..target {
                let seq = self.shared.worker_seq.fetch_add(1, Ordering::Relaxed);
                registry.workers[category.index()].push(worker::spawn_worker(
                    category,
                    seq,
                    Arc::clone(&self.shared.queues[category.index()]),
                    Arc::clone(&self.shared),
                ));
            }
        }
        debug!(
            readers = registry.workers[Category::Reader.index()].len(),
            writers = registry.workers[Category::Writer.index()].len(),
            aux_io = registry.workers[Category::AuxIo.index()].len(),
            non_io = registry.workers[Category::NonIo.index()].len(),
            "spawned worker groups"
        );
    }

    fn drain_all_workers(&self, registry: &mut Registry) -> Vec<WorkerHandle> {
        let mut retiring = Vec::new();
        for slot in registry.workers.iter_mut() {
            retiring.append(slot);
        }
        retiring
    }

    /// Signals, wakes and joins retired workers. Must be called with the
    /// registry unlocked: a worker finishing its current task needs the
    /// registry to complete, so joining under the lock would deadlock.
    fn retire(&self, retiring: Vec<WorkerHandle>) {
        if retiring.is_empty() {
            return;
        }
        for handle in &retiring {
            handle.signal_stop();
        }
        for queue in &self.shared.queues {
            queue.notify_all();
        }
        for handle in retiring {
            handle.join();
        }
    }

    fn resize(&self, category: Category, count: usize) {
        let retiring = {
            let mut registry = self.shared.registry.lock().unwrap();
            registry.desired.set(category, count);
            if registry.taskables.is_empty() {
                // No workers are running; the new size applies at the next
                // first registration.
                Vec::new()
            } else {
                let current = registry.workers[category.index()].len();
                if count >= current {
                    for _ in current..count {
                        let seq = self.shared.worker_seq.fetch_add(1, Ordering::Relaxed);
                        registry.workers[category.index()].push(worker::spawn_worker(
                            category,
                            seq,
                            Arc::clone(&self.shared.queues[category.index()]),
                            Arc::clone(&self.shared),
                        ));
                    }
                    Vec::new()
                } else {
                    registry.workers[category.index()].split_off(count)
                }
            }
        };
        if !retiring.is_empty() {
            debug!(category = %category, count, retiring = retiring.len(), "shrinking worker group");
        }
        self.retire(retiring);
    }

    fn stop_task_group_inner(
        &self,
        gid: TaskableId,
        category: Option<Category>,
        force: bool,
    ) -> bool {
        let mut stopped_any = false;
        let mut registry = self.shared.registry.lock().unwrap();
        loop {
            let matching: Vec<(Arc<ScheduledTask>, Category)> = registry
                .locator
                .values()
                .filter(|(task, cat)| {
                    task.gid() == gid && category.map_or(true, |wanted| wanted == *cat)
                })
                .cloned()
                .collect();
            if matching.is_empty() {
                break;
            }
            stopped_any = true;

            // Cancel and wake with the registry unlocked; workers need it
            // to retire the tasks we are waiting for.
            drop(registry);
            for (task, cat) in &matching {
                if force || !task.complete_before_shutdown() {
                    task.cancel();
                }
                self.shared.queues[cat.index()].wake(task);
            }
            registry = self.shared.registry.lock().unwrap();
            let (guard, _timeout) = self
                .shared
                .task_drained
                .wait_timeout(registry, MIN_SLEEP_TIME)
                .unwrap();
            registry = guard;
        }
        stopped_any
    }
}

impl fmt::Debug for ExecutorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorPool")
            .field("workers", &self.num_workers())
            .field("buckets", &self.num_buckets())
            .field("ready", &self.tot_ready_tasks())
            .finish()
    }
}

/// Binds a configuration key to one category's worker count.
///
/// Registered against `max_num_readers` and friends so that a runtime
/// configuration change resizes the matching worker group.
pub struct ThreadCountListener {
    pool: Arc<ExecutorPool>,
    category: Category,
}

impl ThreadCountListener {
    pub fn new(pool: Arc<ExecutorPool>, category: Category) -> Self {
        Self { pool, category }
    }
}

impl ValueChangedListener for ThreadCountListener {
    fn size_value_changed(&self, key: &str, value: u64) {
        debug!(key, value, category = %self.category, "resizing worker group from configuration");
        match self.category {
            Category::Reader => self.pool.set_max_readers(value as usize),
            Category::Writer => self.pool.set_max_writers(value as usize),
            Category::AuxIo => self.pool.set_max_aux_io(value as usize),
            Category::NonIo => self.pool.set_max_non_io(value as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The calibration table: (max_threads, readers, writers, auxio, nonio).
    const THREAD_COUNT_TABLE: [(usize, usize, usize, usize, usize); 12] = [
        (1, 4, 4, 1, 2),
        (2, 4, 4, 1, 2),
        (4, 4, 4, 1, 2),
        (8, 4, 4, 1, 2),
        (10, 4, 4, 1, 3),
        (14, 4, 4, 2, 4),
        (20, 6, 4, 2, 6),
        (24, 7, 4, 3, 7),
        (32, 12, 4, 4, 8),
        (48, 12, 4, 5, 8),
        (64, 12, 4, 7, 8),
        (128, 12, 4, 8, 8),
    ];

    #[test]
    fn thread_count_calibration() {
        for (max_threads, readers, writers, aux_io, non_io) in THREAD_COUNT_TABLE {
            let counts = ThreadCounts::derive(max_threads, 0, 0, 0, 0);
            assert_eq!(
                counts,
                ThreadCounts {
                    readers,
                    writers,
                    aux_io,
                    non_io
                },
                "max_threads = {}",
                max_threads
            );
        }
    }

    #[test]
    fn explicit_caps_override_formulas() {
        let counts = ThreadCounts::derive(10, 2, 2, 2, 2);
        assert_eq!(
            counts,
            ThreadCounts {
                readers: 2,
                writers: 2,
                aux_io: 2,
                non_io: 2
            }
        );
        assert_eq!(counts.total(), 8);
    }

    #[test]
    fn partial_caps_keep_other_formulas() {
        let counts = ThreadCounts::derive(20, 0, 8, 0, 0);
        assert_eq!(counts.writers, 8);
        assert_eq!(counts.aux_io, 2);
        assert_eq!(counts.non_io, 6);
        // Readers shrink because writers claim more of the budget.
        assert_eq!(counts.readers, 4);
    }

    #[test]
    fn none_spawns_nothing() {
        assert_eq!(ThreadCounts::none().total(), 0);
    }

    #[test]
    fn pool_config_thread_counts_delegates() {
        let config = PoolConfig {
            max_threads: 32,
            max_readers: 0,
            max_writers: 0,
            max_aux_io: 0,
            max_non_io: 0,
        };
        assert_eq!(
            config.thread_counts(),
            ThreadCounts {
                readers: 12,
                writers: 4,
                aux_io: 4,
                non_io: 8
            }
        );
    }

    #[test]
    fn install_and_reset_global_pool() {
        // Only this test touches the process-wide slot in this binary.
        let pool = Arc::new(ExecutorPool::with_thread_counts(
            ThreadCounts::none(),
            Arc::new(crate::time::ManualClock::new()),
        ));
        ExecutorPool::install(Arc::clone(&pool));
        assert!(ExecutorPool::global().is_some());

        let removed = ExecutorPool::reset().unwrap();
        assert!(Arc::ptr_eq(&removed, &pool));
        assert!(ExecutorPool::global().is_none());
    }
}
