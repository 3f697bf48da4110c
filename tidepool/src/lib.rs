//! Tidepool - background execution core for an eventually-persistent,
//! multi-tenant key-value storage engine.
//!
//! This crate provides the shared thread substrate that every background
//! activity of the engine runs on (write-back flushing, compaction, read
//! fetches, auxiliary I/O, periodic maintenance), together with the typed
//! configuration registry that parameterizes it.
//!
//! # Modules
//!
//! - [`executor`] - the executor pool: category-specialized worker threads,
//!   time-ordered task queues, tenant registration and lifecycle.
//! - [`config`] - typed, validated, listenable key/value store of
//!   process-wide tunables.
//! - [`time`] - the monotonic clock seam, virtualizable in tests.
//! - [`logging`] - structured logging bootstrap for binaries and harnesses.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tidepool::executor::{
//!     Category, ExecutorPool, PoolConfig, ScheduledTask, Task, TaskContext, TaskKind, Taskable,
//!     TaskableId, WorkloadPolicy,
//! };
//!
//! struct Bucket;
//!
//! impl Taskable for Bucket {
//!     fn name(&self) -> &str {
//!         "default"
//!     }
//!     fn gid(&self) -> TaskableId {
//!         0
//!     }
//!     fn workload_policy(&self) -> WorkloadPolicy {
//!         WorkloadPolicy::default()
//!     }
//! }
//!
//! struct Noop;
//!
//! impl Task for Noop {
//!     fn run(&self, _ctx: &TaskContext<'_>) -> bool {
//!         false
//!     }
//!     fn description(&self) -> String {
//!         "One-shot task".to_string()
//!     }
//! }
//!
//! let pool = ExecutorPool::new(PoolConfig::default());
//! let bucket: Arc<dyn Taskable> = Arc::new(Bucket);
//! pool.register_taskable(Arc::clone(&bucket)).unwrap();
//!
//! let task = ScheduledTask::new(
//!     Arc::clone(&bucket),
//!     TaskKind::StatSnap,
//!     Duration::from_secs(0),
//!     false,
//!     Box::new(Noop),
//! );
//! pool.schedule(task, Category::Writer).unwrap();
//!
//! pool.unregister_taskable(bucket.as_ref(), true).unwrap();
//! pool.shutdown();
//! ```

pub mod config;
pub mod executor;
pub mod logging;
pub mod time;

/// Version of the tidepool library.
///
/// Defined in `Cargo.toml` and injected at compile time; surfaced through
/// engine stats so a cluster manager can identify the running build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
