//! Tenant handles.
//!
//! A taskable is one registered tenant of the executor pool - in engine
//! terms, a bucket. It owns a set of scheduled tasks, carries the workload
//! policy used when the bucket was created, and receives scheduling
//! telemetry for the tasks it owns.

use super::kind::TaskKind;
use std::time::Duration;

/// Globally unique tenant identifier.
pub type TaskableId = u64;

/// Relative scheduling weight of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPriority {
    Low,
    High,
}

/// Workload policy attached to a tenant at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadPolicy {
    priority: BucketPriority,
    shards: usize,
}

impl WorkloadPolicy {
    pub fn new(priority: BucketPriority, shards: usize) -> Self {
        Self { priority, shards }
    }

    pub fn priority(&self) -> BucketPriority {
        self.priority
    }

    pub fn shards(&self) -> usize {
        self.shards
    }
}

impl Default for WorkloadPolicy {
    fn default() -> Self {
        Self::new(BucketPriority::High, 1)
    }
}

/// A tenant of the executor pool.
///
/// Registered as `Arc<dyn Taskable>`; every task holds a reference to its
/// owner, so telemetry sinks stay callable even while the tenant is being
/// torn down and its task group drained.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: telemetry callbacks arrive from
/// arbitrary worker threads.
pub trait Taskable: Send + Sync {
    /// Human-readable tenant name for logs and stats.
    fn name(&self) -> &str;

    /// Globally unique tenant id.
    fn gid(&self) -> TaskableId;

    /// The workload policy the tenant was created with.
    fn workload_policy(&self) -> WorkloadPolicy;

    /// Records how long a task of `kind` waited in queue past its waketime.
    ///
    /// Default is a no-op for tenants without a stats backend.
    fn log_q_time(&self, kind: TaskKind, wait: Duration) {
        let _ = (kind, wait);
    }

    /// Records how long a task of `kind` spent inside `run()`.
    fn log_run_time(&self, kind: TaskKind, runtime: Duration) {
        let _ = (kind, runtime);
    }
}
