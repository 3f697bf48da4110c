//! Default configuration schema.
//!
//! Every engine tunable the registry knows at startup, with its type tag
//! and default value. Generated originally from the engine's parameter
//! schema; keep the list sorted by key.

use super::value::Value;

/// The initial attribute table for a fresh [`Configuration`].
///
/// [`Configuration`]: super::Configuration
pub(crate) fn default_attributes() -> Vec<(&'static str, Value)> {
    vec![
        ("backend", Value::String("couchstore".to_string())),
        ("bfilter_residency_threshold", Value::Float(0.1)),
        ("bucket_type", Value::String("persistent".to_string())),
        ("chk_remover_stime", Value::UInt(5)),
        ("compaction_write_queue_cap", Value::UInt(10_000)),
        ("conn_notifier_interval", Value::UInt(1)),
        ("dbname", Value::String("./tidepool-data".to_string())),
        ("defragmenter_age_threshold", Value::UInt(10)),
        ("defragmenter_enabled", Value::Bool(true)),
        ("defragmenter_interval", Value::UInt(600)),
        ("exp_pager_stime", Value::UInt(3600)),
        ("failpartialwarmup", Value::Bool(true)),
        ("flushall_enabled", Value::Bool(false)),
        ("max_num_auxio", Value::UInt(0)),
        ("max_num_nonio", Value::UInt(0)),
        ("max_num_readers", Value::UInt(0)),
        ("max_num_writers", Value::UInt(0)),
        ("max_size", Value::UInt(0)),
        ("max_threads", Value::UInt(0)),
        ("mutation_mem_threshold", Value::Float(0.93)),
        ("replication_throttle_cap_pcnt", Value::UInt(10)),
        ("replication_throttle_queue_cap", Value::SInt(-1)),
        ("stat_snap_interval", Value::UInt(60)),
        ("warmup", Value::Bool(true)),
    ]
}
