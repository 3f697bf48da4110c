//! Per-category task queues.
//!
//! A `TaskQueue` time-orders one category's work across all tenants. Tasks
//! wait in the **future** heap (earliest waketime first) until due, get
//! promoted into the **ready** heap (highest priority first) and are
//! dispensed to workers from there. Each queue pairs a mutex-guarded pair
//! of heaps with a condvar that idle workers sleep on.

use super::kind::Category;
use super::task::ScheduledTask;
use crate::time::Clock;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Upper bound on a worker's uninterrupted sleep in [`TaskQueue::fetch_next_task`].
///
/// Sleeping workers re-check their queue at least this often, so a missed
/// notification delays a task by at most this much rather than forever.
pub const MIN_SLEEP_TIME: Duration = Duration::from_secs(2);

/// Future-heap entry, ordered earliest waketime first (FIFO among equals).
struct FutureEntry {
    waketime: Instant,
    seq: u64,
    task: Arc<ScheduledTask>,
}

impl PartialEq for FutureEntry {
    fn eq(&self, other: &Self) -> bool {
        self.waketime == other.waketime && self.seq == other.seq
    }
}

impl Eq for FutureEntry {}

impl PartialOrd for FutureEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for FutureEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed: BinaryHeap is a max-heap, we pop the earliest waketime.
        other
            .waketime
            .cmp(&self.waketime)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Ready-heap entry, ordered by priority, then waketime-derived age, then
/// insertion order.
struct ReadyEntry {
    priority: u8,
    waketime: Instant,
    seq: u64,
    task: Arc<ScheduledTask>,
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.waketime == other.waketime && self.seq == other.seq
    }
}

impl Eq for ReadyEntry {}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed: smallest priority value pops first.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.waketime.cmp(&self.waketime))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueInner {
    future: BinaryHeap<FutureEntry>,
    ready: BinaryHeap<ReadyEntry>,
    seq: u64,
}

impl QueueInner {
    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }
}

/// Ordered container for one category's tasks.
pub struct TaskQueue {
    category: Category,
    name: String,
    clock: Arc<dyn Clock>,
    inner: Mutex<QueueInner>,
    work_available: Condvar,
    ready_count: AtomicUsize,
    tot_ready: Arc<AtomicUsize>,
}

impl TaskQueue {
    pub(crate) fn new(
        category: Category,
        clock: Arc<dyn Clock>,
        tot_ready: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            category,
            name: format!("{}_queue", category),
            clock,
            inner: Mutex::new(QueueInner {
                future: BinaryHeap::new(),
                ready: BinaryHeap::new(),
                seq: 0,
            }),
            work_available: Condvar::new(),
            ready_count: AtomicUsize::new(0),
            tot_ready,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks whose waketime has not yet arrived.
    pub fn future_queue_size(&self) -> usize {
        self.inner.lock().unwrap().future.len()
    }

    /// Number of tasks eligible to run now.
    pub fn ready_queue_size(&self) -> usize {
        self.inner.lock().unwrap().ready.len()
    }

    /// Ready count, maintained lock-free for the pool's aggregate stats.
    pub fn num_ready(&self) -> usize {
        self.ready_count.load(Ordering::SeqCst)
    }

    /// Inserts a task into the future queue at its recorded waketime.
    ///
    /// Wakes one idle worker when the task is already due.
    pub(crate) fn schedule(&self, task: &Arc<ScheduledTask>) {
        let now = self.clock.now();
        let waketime = task.waketime();
        let due = {
            let mut inner = self.inner.lock().unwrap();
            let seq = inner.next_seq();
            inner.future.push(FutureEntry {
                waketime,
                seq,
                task: Arc::clone(task),
            });
            waketime <= now
        };
        if due {
            self.work_available.notify_one();
        }
        tracing::trace!(
            queue = %self.name,
            task = task.id(),
            kind = %task.kind(),
            "scheduled"
        );
    }

    /// Marks a queued task due immediately.
    ///
    /// The task stays in the future queue (the next fetch promotes it);
    /// waking a task therefore cannot starve siblings that were already
    /// promoted to the ready queue. A task found in the ready queue is
    /// moved back to the future queue with the counters kept in step; a
    /// task in neither queue (currently running) only gets its waketime
    /// reset, so it reruns promptly once rescheduled.
    pub(crate) fn wake(&self, task: &Arc<ScheduledTask>) {
        let now = self.clock.now();
        {
            let mut inner = self.inner.lock().unwrap();
            let was_queued = self.remove_task(&mut inner, task);
            task.set_waketime(now);
            if was_queued {
                let seq = inner.next_seq();
                inner.future.push(FutureEntry {
                    waketime: now,
                    seq,
                    task: Arc::clone(task),
                });
            }
        }
        self.work_available.notify_one();
    }

    /// Moves a queued task's waketime to `now + sleep`.
    pub(crate) fn snooze(&self, task: &Arc<ScheduledTask>, sleep: Duration) {
        let wake_at = self.clock.now() + sleep;
        {
            let mut inner = self.inner.lock().unwrap();
            let was_queued = self.remove_task(&mut inner, task);
            task.set_waketime(wake_at);
            if was_queued {
                let seq = inner.next_seq();
                inner.future.push(FutureEntry {
                    waketime: wake_at,
                    seq,
                    task: Arc::clone(task),
                });
            }
        }
        // The earliest deadline may have moved; sleeping workers recompute.
        self.work_available.notify_one();
    }

    /// Re-inserts a task after `run()` returned true.
    ///
    /// Uses the task's current waketime, which `run()` may have reset via
    /// snooze; no fetch-time value is reused.
    pub(crate) fn reschedule(&self, task: &Arc<ScheduledTask>) {
        self.schedule(task);
    }

    /// Blocking fetch used by worker threads.
    ///
    /// Atomically sweeps due tasks from the future queue into the ready
    /// queue, pops the best ready task, or sleeps until the earliest future
    /// waketime (capped at [`MIN_SLEEP_TIME`]). Returns `None` once `stop`
    /// is raised.
    pub(crate) fn fetch_next_task(&self, stop: &AtomicBool) -> Option<Arc<ScheduledTask>> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if stop.load(Ordering::Acquire) {
                return None;
            }
            let now = self.clock.now();
            self.promote_due(&mut inner, now);
            if let Some(entry) = inner.ready.pop() {
                self.ready_count.fetch_sub(1, Ordering::SeqCst);
                self.tot_ready.fetch_sub(1, Ordering::SeqCst);
                return Some(entry.task);
            }
            let wait = match inner.future.peek() {
                Some(head) => head.waketime.saturating_duration_since(now).min(MIN_SLEEP_TIME),
                None => MIN_SLEEP_TIME,
            };
            let (guard, _timeout) = self.work_available.wait_timeout(inner, wait).unwrap();
            inner = guard;
        }
    }

    /// Non-blocking fetch for single-threaded drivers and tests.
    pub fn try_fetch_next_task(&self) -> Option<Arc<ScheduledTask>> {
        let mut inner = self.inner.lock().unwrap();
        let now = self.clock.now();
        self.promote_due(&mut inner, now);
        let entry = inner.ready.pop()?;
        self.ready_count.fetch_sub(1, Ordering::SeqCst);
        self.tot_ready.fetch_sub(1, Ordering::SeqCst);
        Some(entry.task)
    }

    /// Empties both heaps, returning the drained tasks.
    pub(crate) fn clear(&self) -> Vec<Arc<ScheduledTask>> {
        let mut inner = self.inner.lock().unwrap();
        let mut drained = Vec::with_capacity(inner.future.len() + inner.ready.len());
        for entry in std::mem::take(&mut inner.future) {
            drained.push(entry.task);
        }
        for entry in std::mem::take(&mut inner.ready) {
            self.ready_count.fetch_sub(1, Ordering::SeqCst);
            self.tot_ready.fetch_sub(1, Ordering::SeqCst);
            drained.push(entry.task);
        }
        drained
    }

    /// Wakes every sleeper; used when workers are told to exit.
    ///
    /// Taken under the queue lock so a worker between its stop-flag check
    /// and parking cannot miss the notification.
    pub(crate) fn notify_all(&self) {
        let _inner = self.inner.lock().unwrap();
        self.work_available.notify_all();
    }

    /// Sweeps due tasks from the future heap into the ready heap.
    ///
    /// Deliberately a no-op while the ready heap is non-empty: promoting on
    /// top of already-ready tasks would let a stream of freshly-woken
    /// high-priority tasks starve ready siblings of their turn.
    fn promote_due(&self, inner: &mut QueueInner, now: Instant) {
        if !inner.ready.is_empty() {
            return;
        }
        while inner
            .future
            .peek()
            .is_some_and(|head| head.waketime <= now)
        {
            let entry = inner.future.pop().unwrap();
            let seq = inner.next_seq();
            inner.ready.push(ReadyEntry {
                priority: entry.task.priority(),
                waketime: entry.waketime,
                seq,
                task: entry.task,
            });
            self.ready_count.fetch_add(1, Ordering::SeqCst);
            self.tot_ready.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Removes every queued entry for `task`, fixing ready counters.
    ///
    /// Returns whether the task was present in either heap.
    fn remove_task(&self, inner: &mut QueueInner, task: &Arc<ScheduledTask>) -> bool {
        let mut found = false;
        let future = std::mem::take(&mut inner.future);
        inner.future = future
            .into_iter()
            .filter(|entry| {
                if Arc::ptr_eq(&entry.task, task) {
                    found = true;
                    false
                } else {
                    true
                }
            })
            .collect();
        let ready = std::mem::take(&mut inner.ready);
        inner.ready = ready
            .into_iter()
            .filter(|entry| {
                if Arc::ptr_eq(&entry.task, task) {
                    found = true;
                    self.ready_count.fetch_sub(1, Ordering::SeqCst);
                    self.tot_ready.fetch_sub(1, Ordering::SeqCst);
                    false
                } else {
                    true
                }
            })
            .collect();
        found
    }
}
