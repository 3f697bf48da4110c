//! Executor pool and task scheduler.
//!
//! Every background activity of the engine - flushing, compaction, read
//! fetches, backfills, periodic maintenance - runs as a task on a shared,
//! fixed-size pool of category-specialized worker threads.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ExecutorPool                          │
//! │  register/unregister taskables, schedule/wake/cancel tasks,  │
//! │  size worker groups, stop task groups, global shutdown       │
//! ├──────────────┬──────────────┬──────────────┬─────────────────┤
//! │ TaskQueue    │ TaskQueue    │ TaskQueue    │ TaskQueue       │
//! │ (Reader)     │ (Writer)     │ (AuxIO)      │ (NonIO)         │
//! │ future+ready │ future+ready │ future+ready │ future+ready    │
//! ├──────────────┴──────────────┴──────────────┴─────────────────┤
//! │ WorkerThreads: fetch → run → reschedule/retire               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core concepts
//!
//! - **Task**: one unit of background work. `run()` returns `true` to be
//!   rescheduled at its current waketime, `false` to die.
//!
//! - **Taskable**: a registered tenant (a bucket). Owns tasks, carries the
//!   workload policy and receives queue-wait/run-time telemetry.
//!
//! - **Category**: one of four fixed worker groups (`Reader`, `Writer`,
//!   `AuxIO`, `NonIO`). Worker counts per category derive from the pool's
//!   thread budget.
//!
//! - **Future / ready queues**: a scheduled task waits in the future queue
//!   until its waketime arrives, is promoted to the ready queue, and is
//!   dispensed to workers in priority order.
//!
//! # Example
//!
//! ```ignore
//! use tidepool::executor::{Category, ExecutorPool, PoolConfig, ScheduledTask, TaskKind};
//!
//! let pool = ExecutorPool::new(PoolConfig::default());
//! pool.register_taskable(bucket.clone())?;
//!
//! let task = ScheduledTask::new(bucket, TaskKind::Flusher, sleep, true, Box::new(flusher));
//! let id = pool.schedule(task, Category::Writer)?;
//!
//! pool.wake(id);
//! pool.unregister_taskable(bucket.as_ref(), false)?;
//! ```

mod kind;
mod pool;
mod queue;
mod task;
mod taskable;
mod worker;

pub use kind::{Category, TaskKind};
pub use pool::{ExecutorError, ExecutorPool, PoolConfig, ThreadCountListener, ThreadCounts};
pub use queue::{TaskQueue, MIN_SLEEP_TIME};
pub use task::{ScheduledTask, Task, TaskContext, TaskId, TaskState};
pub use taskable::{BucketPriority, Taskable, TaskableId, WorkloadPolicy};
