//! Tasks and their scheduling state.
//!
//! The work itself is a [`Task`] trait object; the scheduler wraps it in a
//! [`ScheduledTask`] record carrying identity, category priority, waketime
//! and the runnable/running/dead state machine. Scheduled tasks are
//! shared-ownership (`Arc`): the pool's locator, the queue entries and the
//! worker currently executing `run()` each hold a reference, so a task can
//! safely finish running even while its tenant is mid-teardown.

use super::kind::TaskKind;
use super::taskable::{Taskable, TaskableId};
use crate::time::Clock;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Unique id of a scheduled task, allocated at construction.
pub type TaskId = u64;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a scheduled task. `Dead` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Runnable,
    Running,
    Dead,
}

impl TaskState {
    fn from_u8(value: u8) -> TaskState {
        match value {
            0 => TaskState::Runnable,
            1 => TaskState::Running,
            _ => TaskState::Dead,
        }
    }
}

/// One unit of background work.
///
/// Implementations keep task-local state behind interior mutability;
/// `run()` is entered by at most one worker at a time.
pub trait Task: Send + Sync {
    /// Performs one slice of work.
    ///
    /// Returning `true` asks the pool to reschedule the task at its current
    /// waketime (typically reset via [`TaskContext::snooze`]); returning
    /// `false` marks the task dead. A panic escaping `run()` is treated as
    /// a `false` return.
    fn run(&self, ctx: &TaskContext<'_>) -> bool;

    /// Human-readable description, stable enough to log against.
    fn description(&self) -> String;
}

/// Execution context handed to [`Task::run`].
///
/// Borrows the scheduled-task record and the pool clock so the task can
/// snooze itself and observe cancellation without reaching back into the
/// pool.
pub struct TaskContext<'a> {
    task: &'a ScheduledTask,
    clock: &'a dyn Clock,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(task: &'a ScheduledTask, clock: &'a dyn Clock) -> Self {
        Self { task, clock }
    }

    /// Pushes the task's waketime to `now + sleep`, measured at call time.
    ///
    /// When `run()` later returns `true`, the reschedule uses this updated
    /// waketime rather than any value recorded at fetch time.
    pub fn snooze(&self, sleep: Duration) {
        self.task.set_waketime(self.clock.now() + sleep);
    }

    /// True once the task has been cancelled.
    ///
    /// Long-running tasks poll this to bail out early during forced
    /// shutdown.
    pub fn is_cancelled(&self) -> bool {
        self.task.is_dead()
    }
}

/// A task wrapped with its scheduling metadata.
pub struct ScheduledTask {
    id: TaskId,
    kind: TaskKind,
    priority: u8,
    owner: Arc<dyn Taskable>,
    complete_before_shutdown: bool,
    initial_sleep: Duration,
    state: AtomicU8,
    waketime: Mutex<Instant>,
    task: Box<dyn Task>,
}

impl ScheduledTask {
    /// Wraps `task` for scheduling on behalf of `owner`.
    ///
    /// The waketime is provisional until the pool accepts the task; at
    /// schedule time it becomes `now + sleep` on the pool clock.
    pub fn new(
        owner: Arc<dyn Taskable>,
        kind: TaskKind,
        sleep: Duration,
        complete_before_shutdown: bool,
        task: Box<dyn Task>,
    ) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            priority: kind.priority(),
            owner,
            complete_before_shutdown,
            initial_sleep: sleep,
            state: AtomicU8::new(TaskState::Runnable as u8),
            waketime: Mutex::new(Instant::now()),
            task,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Numeric priority inherited from the kind; smaller wins.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn owner(&self) -> &Arc<dyn Taskable> {
        &self.owner
    }

    pub fn gid(&self) -> TaskableId {
        self.owner.gid()
    }

    pub fn complete_before_shutdown(&self) -> bool {
        self.complete_before_shutdown
    }

    /// The sleep requested when the task was built; the pool turns this
    /// into the initial waketime at schedule time.
    pub(crate) fn initial_sleep(&self) -> Duration {
        self.initial_sleep
    }

    pub fn description(&self) -> String {
        self.task.description()
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_dead(&self) -> bool {
        self.state() == TaskState::Dead
    }

    /// Marks the task dead. Idempotent; dead tasks never resurrect.
    pub fn cancel(&self) {
        self.state.store(TaskState::Dead as u8, Ordering::Release);
    }

    /// Runnable -> Running, unless already dead.
    pub(crate) fn set_running(&self) {
        let _ = self.state.compare_exchange(
            TaskState::Runnable as u8,
            TaskState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Running -> Runnable, unless cancelled mid-run.
    pub(crate) fn make_runnable(&self) {
        let _ = self.state.compare_exchange(
            TaskState::Running as u8,
            TaskState::Runnable as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn waketime(&self) -> Instant {
        *self.waketime.lock().unwrap()
    }

    pub(crate) fn set_waketime(&self, at: Instant) {
        *self.waketime.lock().unwrap() = at;
    }

    pub(crate) fn execute(&self, ctx: &TaskContext<'_>) -> bool {
        self.task.run(ctx)
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
