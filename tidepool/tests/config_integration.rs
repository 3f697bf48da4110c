//! Integration tests for the configuration registry.
//!
//! These tests cover the registry working against its consumers:
//! - Typed round-trips and the `cache_size` alias
//! - Validator veto semantics
//! - Listener ordering across direct sets and text parsing
//! - `config_file` expansion
//! - The stats surface
//! - Configuration-driven executor pool sizing

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tidepool::config::{
    ConfigError, Configuration, SizeRangeValidator, ValueChangedListener,
};
use tidepool::executor::{
    Category, ExecutorPool, PoolConfig, TaskKind, Taskable, TaskableId, ThreadCountListener,
    WorkloadPolicy,
};

// =============================================================================
// Test helpers
// =============================================================================

struct RecordingListener {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl ValueChangedListener for RecordingListener {
    fn boolean_value_changed(&self, key: &str, value: bool) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}={}", self.label, key, value));
    }

    fn size_value_changed(&self, key: &str, value: u64) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}={}", self.label, key, value));
    }

    fn string_value_changed(&self, key: &str, value: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}={}", self.label, key, value));
    }
}

struct SizerBucket;

impl Taskable for SizerBucket {
    fn name(&self) -> &str {
        "sizer"
    }
    fn gid(&self) -> TaskableId {
        1
    }
    fn workload_policy(&self) -> WorkloadPolicy {
        WorkloadPolicy::default()
    }
    fn log_q_time(&self, _kind: TaskKind, _wait: Duration) {}
}

fn scratch_file(contents: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("tidepool_cfg_it_{}.txt", nanos));
    fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// Round trips, alias, validation
// =============================================================================

#[test]
fn integer_round_trip() {
    let config = Configuration::new();
    config.set_integer("max_size", 1_048_576).unwrap();
    assert_eq!(config.get_integer("max_size").unwrap(), 1_048_576);
}

#[test]
fn cache_size_alias_round_trip() {
    let config = Configuration::new();

    config.set_integer("cache_size", 2_097_152).unwrap();
    assert_eq!(config.get_integer("max_size").unwrap(), 2_097_152);
    // Documented asymmetry: the alias never becomes readable itself.
    assert_eq!(config.get_integer("cache_size").unwrap(), 0);

    // Listeners registered on the alias fire with the value routed to
    // max_size.
    let log = Arc::new(Mutex::new(Vec::new()));
    config.add_value_changed_listener(
        "cache_size",
        Arc::new(RecordingListener {
            label: "alias",
            log: Arc::clone(&log),
        }),
    );
    config.set_integer("cache_size", 4_194_304).unwrap();
    assert_eq!(config.get_integer("max_size").unwrap(), 4_194_304);
    assert_eq!(*log.lock().unwrap(), vec!["alias:cache_size=4194304"]);
}

#[test]
fn validator_rejects_and_preserves_previous_value() {
    let config = Configuration::new();
    config.set_integer("max_size", 1_048_576).unwrap();
    config.set_value_validator("max_size", Box::new(SizeRangeValidator::new(1, u64::MAX)));

    let log = Arc::new(Mutex::new(Vec::new()));
    config.add_value_changed_listener(
        "max_size",
        Arc::new(RecordingListener {
            label: "watcher",
            log: Arc::clone(&log),
        }),
    );

    let err = config.set_integer("max_size", 0).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));

    // Previous value intact, no listener fired.
    assert_eq!(config.get_integer("max_size").unwrap(), 1_048_576);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn kind_mismatch_on_stored_tag() {
    let config = Configuration::new();
    assert!(matches!(
        config.get_string("max_size").unwrap_err(),
        ConfigError::KindMismatch { .. }
    ));
    assert!(matches!(
        config.get_integer("warmup").unwrap_err(),
        ConfigError::KindMismatch { .. }
    ));
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn parse_configuration_applies_and_notifies() {
    let config = Configuration::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    for key in ["max_size", "warmup", "dbname"] {
        config.add_value_changed_listener(
            key,
            Arc::new(RecordingListener {
                label: "parse",
                log: Arc::clone(&log),
            }),
        );
    }

    config
        .parse_configuration("max_size=262144;warmup=false;dbname=/data/b7")
        .unwrap();

    assert_eq!(config.get_integer("max_size").unwrap(), 262_144);
    assert!(!config.get_bool("warmup").unwrap());
    assert_eq!(config.get_string("dbname").unwrap(), "/data/b7");

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            "parse:max_size=262144".to_string(),
            "parse:warmup=false".to_string(),
            "parse:dbname=/data/b7".to_string(),
        ]
    );
}

#[test]
fn parse_configuration_expands_config_file() {
    let config = Configuration::new();
    let path = scratch_file("exp_pager_stime=7200;defragmenter_enabled=false");

    config
        .parse_configuration(&format!("max_size=1;config_file={}", path.display()))
        .unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.get_integer("max_size").unwrap(), 1);
    assert_eq!(config.get_integer("exp_pager_stime").unwrap(), 7200);
    assert!(!config.get_bool("defragmenter_enabled").unwrap());

    // The marker never reaches storage.
    assert_eq!(config.get_integer("config_file").unwrap(), 0);
    let mut stats = Vec::new();
    config.add_stats(|key, value| stats.push((key.to_string(), value.to_string())));
    assert!(!stats.iter().any(|(key, _)| key == "ep_config_file"));
}

#[test]
fn parse_configuration_rejects_unknown_keys() {
    let config = Configuration::new();
    let err = config.parse_configuration("no_such_tunable=1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn parse_configuration_accepts_cache_size_alias() {
    let config = Configuration::new();
    config.parse_configuration("cache_size=524288").unwrap();
    assert_eq!(config.get_integer("max_size").unwrap(), 524_288);
    assert_eq!(config.get_integer("cache_size").unwrap(), 0);
}

// =============================================================================
// Stats
// =============================================================================

#[test]
fn stats_emit_prefixed_keys_in_stored_order() {
    let config = Configuration::new();
    config.set_integer("max_size", 8192).unwrap();

    let mut stats = Vec::new();
    config.add_stats(|key, value| stats.push((key.to_string(), value.to_string())));

    assert!(stats.iter().all(|(key, _)| key.starts_with("ep_")));
    assert!(stats.contains(&("ep_max_size".to_string(), "8192".to_string())));
    assert!(stats.contains(&("ep_warmup".to_string(), "true".to_string())));
    assert!(stats.contains(&("ep_backend".to_string(), "couchstore".to_string())));
    assert!(stats.contains(&(
        "ep_replication_throttle_queue_cap".to_string(),
        "-1".to_string()
    )));

    let keys: Vec<&str> = stats.iter().map(|(key, _)| key.as_str()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

// =============================================================================
// Configuration-driven pool sizing
// =============================================================================

#[test]
fn pool_sizing_comes_from_configuration() {
    let config = Configuration::new();
    config.set_integer("max_threads", 10).unwrap();
    for key in [
        "max_num_readers",
        "max_num_writers",
        "max_num_auxio",
        "max_num_nonio",
    ] {
        config.set_integer(key, 2).unwrap();
    }

    let pool_config = PoolConfig::from_configuration(&config).unwrap();
    assert_eq!(pool_config.thread_counts().total(), 8);

    let pool = Arc::new(ExecutorPool::new(pool_config));
    let bucket: Arc<dyn Taskable> = Arc::new(SizerBucket);
    pool.register_taskable(Arc::clone(&bucket)).unwrap();
    assert_eq!(pool.num_workers(), 8);

    // A runtime change to the writer count resizes the live pool.
    config.add_value_changed_listener(
        "max_num_writers",
        Arc::new(ThreadCountListener::new(
            Arc::clone(&pool),
            Category::Writer,
        )),
    );
    config.set_integer("max_num_writers", 1).unwrap();
    assert_eq!(pool.num_writers(), 1);

    pool.unregister_taskable(bucket.as_ref(), false).unwrap();
    pool.shutdown();
}
