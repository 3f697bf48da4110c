//! Worker categories and the closed task-kind registry.
//!
//! Every task kind is statically assigned a category, a display name and a
//! base priority. Priorities are compared numerically: smaller values win
//! within a queue.

use std::fmt;

/// One of the four fixed worker groups.
///
/// The set is closed; categories are encoded as the small integers `0..4`
/// and double as indexes into the pool's queue and worker tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Category {
    /// Disk read work: warmup, background fetches.
    Reader = 0,
    /// Disk write work: write-back flushing, stats persistence.
    Writer = 1,
    /// Auxiliary I/O: backfills, access log scanning, backup.
    AuxIo = 2,
    /// Non-I/O periodic maintenance: notifications, pagers, defragmenter.
    NonIo = 3,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 4;

    /// All categories, in index order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Reader,
        Category::Writer,
        Category::AuxIo,
        Category::NonIo,
    ];

    /// The category's index in `0..COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lower-case display name, used in thread and queue names.
    pub fn name(self) -> &'static str {
        match self {
            Category::Reader => "reader",
            Category::Writer => "writer",
            Category::AuxIo => "auxio",
            Category::NonIo => "nonio",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed enumeration of task kinds the engine schedules.
///
/// Each kind carries its compile-time category assignment and base
/// priority; the scheduler never learns about kinds dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Load items from disk on startup.
    Warmup,
    /// Fetch non-resident values for pending reads.
    BgFetcher,
    /// Write dirty items back to disk.
    Flusher,
    /// Persist the periodic stats snapshot.
    StatSnap,
    /// Maintain the access log for warmup ordering.
    AccessScanner,
    /// Drive checkpoint processing for active DCP streams.
    ActiveStreamCheckpointProcessorTask,
    /// Pump disk backfills for DCP connections.
    BackfillManagerTask,
    /// Notify connections blocked on pending operations.
    PendingOpsNotification,
    /// Evict items when memory is above the high watermark.
    ItemPager,
    /// Wake idle connection notifier couriers.
    ConnNotifier,
    /// Remove closed, unreferenced checkpoints.
    ClosedUnrefCheckpointRemoverTask,
    /// Defragment hash table storage.
    DefragmenterTask,
}

impl TaskKind {
    /// The worker category this kind always runs on.
    pub fn category(self) -> Category {
        match self {
            TaskKind::Warmup | TaskKind::BgFetcher => Category::Reader,
            TaskKind::Flusher | TaskKind::StatSnap => Category::Writer,
            TaskKind::AccessScanner
            | TaskKind::ActiveStreamCheckpointProcessorTask
            | TaskKind::BackfillManagerTask => Category::AuxIo,
            TaskKind::PendingOpsNotification
            | TaskKind::ItemPager
            | TaskKind::ConnNotifier
            | TaskKind::ClosedUnrefCheckpointRemoverTask
            | TaskKind::DefragmenterTask => Category::NonIo,
        }
    }

    /// Base priority; smaller is more urgent within a queue.
    pub fn priority(self) -> u8 {
        match self {
            TaskKind::Warmup => 0,
            TaskKind::BgFetcher => 6,
            TaskKind::Flusher => 5,
            TaskKind::StatSnap => 9,
            TaskKind::AccessScanner => 3,
            TaskKind::ActiveStreamCheckpointProcessorTask => 5,
            TaskKind::BackfillManagerTask => 8,
            TaskKind::PendingOpsNotification => 0,
            TaskKind::ItemPager => 1,
            TaskKind::ConnNotifier => 5,
            TaskKind::ClosedUnrefCheckpointRemoverTask => 6,
            TaskKind::DefragmenterTask => 10,
        }
    }

    /// Static kind name, stable across the process lifetime.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Warmup => "Warmup",
            TaskKind::BgFetcher => "BgFetcher",
            TaskKind::Flusher => "Flusher",
            TaskKind::StatSnap => "StatSnap",
            TaskKind::AccessScanner => "AccessScanner",
            TaskKind::ActiveStreamCheckpointProcessorTask => {
                "ActiveStreamCheckpointProcessorTask"
            }
            TaskKind::BackfillManagerTask => "BackfillManagerTask",
            TaskKind::PendingOpsNotification => "PendingOpsNotification",
            TaskKind::ItemPager => "ItemPager",
            TaskKind::ConnNotifier => "ConnNotifier",
            TaskKind::ClosedUnrefCheckpointRemoverTask => "ClosedUnrefCheckpointRemoverTask",
            TaskKind::DefragmenterTask => "DefragmenterTask",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_indexes_are_stable() {
        assert_eq!(Category::Reader.index(), 0);
        assert_eq!(Category::Writer.index(), 1);
        assert_eq!(Category::AuxIo.index(), 2);
        assert_eq!(Category::NonIo.index(), 3);
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn kinds_map_to_expected_categories() {
        assert_eq!(TaskKind::Flusher.category(), Category::Writer);
        assert_eq!(TaskKind::StatSnap.category(), Category::Writer);
        assert_eq!(TaskKind::BackfillManagerTask.category(), Category::AuxIo);
        assert_eq!(
            TaskKind::ActiveStreamCheckpointProcessorTask.category(),
            Category::AuxIo
        );
        assert_eq!(
            TaskKind::PendingOpsNotification.category(),
            Category::NonIo
        );
        assert_eq!(TaskKind::DefragmenterTask.category(), Category::NonIo);
        assert_eq!(TaskKind::Warmup.category(), Category::Reader);
    }

    #[test]
    fn notification_outranks_defragmenter() {
        // The NonIO regression scenarios depend on this ordering.
        assert!(
            TaskKind::PendingOpsNotification.priority() < TaskKind::DefragmenterTask.priority()
        );
    }

    #[test]
    fn display_uses_static_names() {
        assert_eq!(TaskKind::PendingOpsNotification.to_string(), "PendingOpsNotification");
        assert_eq!(Category::AuxIo.to_string(), "auxio");
    }
}
