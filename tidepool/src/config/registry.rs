//! The configuration registry.
//!
//! One mutex guards the whole attribute map. Validators run inside the
//! lock; listener callbacks are collected inside the lock but invoked only
//! after it is released, so a listener may re-enter the registry without
//! deadlocking.

use super::defaults::default_attributes;
use super::listener::{ValueChangedListener, ValueChangedValidator};
use super::parser;
use super::value::{Value, ValueKind};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A get or set ran against a different tag than the key stores.
    #[error("configuration key '{key}' holds a {actual} value, not {expected}")]
    KindMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A validator rejected the proposed value.
    #[error("invalid value for configuration key '{key}': {reason}")]
    ValidationError { key: String, reason: String },

    /// Malformed configuration text or an unknown key.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Programmer error; the operation is aborted.
    #[error("configuration invariant violated: {0}")]
    InvariantViolation(String),
}

struct Attribute {
    value: Value,
    validator: Option<Box<dyn ValueChangedValidator>>,
    listeners: Vec<Arc<dyn ValueChangedListener>>,
}

impl Attribute {
    fn new(value: Value) -> Self {
        Self {
            value,
            validator: None,
            listeners: Vec::new(),
        }
    }
}

/// Typed, validated, listenable key/value store of engine tunables.
pub struct Configuration {
    attributes: Mutex<BTreeMap<String, Attribute>>,
}

impl Configuration {
    /// Creates a registry populated with the default schema.
    pub fn new() -> Self {
        let mut attributes = BTreeMap::new();
        for (key, value) in default_attributes() {
            attributes.insert(key.to_string(), Attribute::new(value));
        }
        Self {
            attributes: Mutex::new(attributes),
        }
    }

    /// Reads a bool; `false` when the key is absent.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let attributes = self.attributes.lock().unwrap();
        match attributes.get(key) {
            None => Ok(false),
            Some(attr) => match attr.value {
                Value::Bool(v) => Ok(v),
                ref other => Err(kind_mismatch(key, ValueKind::Bool, other)),
            },
        }
    }

    /// Reads an unsigned integer; `0` when the key is absent.
    pub fn get_integer(&self, key: &str) -> Result<u64, ConfigError> {
        let attributes = self.attributes.lock().unwrap();
        match attributes.get(key) {
            None => Ok(0),
            Some(attr) => match attr.value {
                Value::UInt(v) => Ok(v),
                ref other => Err(kind_mismatch(key, ValueKind::UInt, other)),
            },
        }
    }

    /// Reads a signed integer; `0` when the key is absent.
    pub fn get_signed_integer(&self, key: &str) -> Result<i64, ConfigError> {
        let attributes = self.attributes.lock().unwrap();
        match attributes.get(key) {
            None => Ok(0),
            Some(attr) => match attr.value {
                Value::SInt(v) => Ok(v),
                ref other => Err(kind_mismatch(key, ValueKind::SInt, other)),
            },
        }
    }

    /// Reads a float; `0.0` when the key is absent.
    pub fn get_float(&self, key: &str) -> Result<f64, ConfigError> {
        let attributes = self.attributes.lock().unwrap();
        match attributes.get(key) {
            None => Ok(0.0),
            Some(attr) => match attr.value {
                Value::Float(v) => Ok(v),
                ref other => Err(kind_mismatch(key, ValueKind::Float, other)),
            },
        }
    }

    /// Reads a string; empty when the key is absent.
    pub fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        let attributes = self.attributes.lock().unwrap();
        match attributes.get(key) {
            None => Ok(String::new()),
            Some(attr) => match attr.value {
                Value::String(ref v) => Ok(v.clone()),
                ref other => Err(kind_mismatch(key, ValueKind::String, other)),
            },
        }
    }

    /// Stores a bool, then notifies the key's listeners.
    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), ConfigError> {
        let listeners = {
            let mut attributes = self.attributes.lock().unwrap();
            validate(&attributes, key, |v| v.validate_bool(key, value))?;
            let attr = attributes
                .entry(key.to_string())
                .or_insert_with(|| Attribute::new(Value::Bool(false)));
            attr.value = Value::Bool(value);
            attr.listeners.clone()
        };
        for listener in listeners {
            listener.boolean_value_changed(key, value);
        }
        Ok(())
    }

    /// Stores an unsigned integer, then notifies the key's listeners.
    ///
    /// `cache_size` is a write-only alias for `max_size`: the value lands
    /// in `max_size`, while `cache_size`'s own listeners fire and its
    /// readable value stays at the default `0`.
    pub fn set_integer(&self, key: &str, value: u64) -> Result<(), ConfigError> {
        let listeners = {
            let mut attributes = self.attributes.lock().unwrap();
            validate(&attributes, key, |v| v.validate_size(key, value))?;
            if key == "cache_size" {
                let alias = attributes
                    .entry(key.to_string())
                    .or_insert_with(|| Attribute::new(Value::UInt(0)));
                if alias.value.kind() != ValueKind::UInt {
                    alias.value = Value::UInt(0);
                }
                let target = attributes
                    .entry("max_size".to_string())
                    .or_insert_with(|| Attribute::new(Value::UInt(0)));
                target.value = Value::UInt(value);
                attributes[key].listeners.clone()
            } else {
                let attr = attributes
                    .entry(key.to_string())
                    .or_insert_with(|| Attribute::new(Value::UInt(0)));
                attr.value = Value::UInt(value);
                attr.listeners.clone()
            }
        };
        for listener in listeners {
            listener.size_value_changed(key, value);
        }
        Ok(())
    }

    /// Stores a signed integer, then notifies the key's listeners.
    ///
    /// Honors the `cache_size -> max_size` alias like [`set_integer`].
    ///
    /// [`set_integer`]: Configuration::set_integer
    pub fn set_signed_integer(&self, key: &str, value: i64) -> Result<(), ConfigError> {
        let listeners = {
            let mut attributes = self.attributes.lock().unwrap();
            validate(&attributes, key, |v| v.validate_ssize(key, value))?;
            if key == "cache_size" {
                let alias = attributes
                    .entry(key.to_string())
                    .or_insert_with(|| Attribute::new(Value::SInt(0)));
                if alias.value.kind() != ValueKind::SInt {
                    alias.value = Value::SInt(0);
                }
                let target = attributes
                    .entry("max_size".to_string())
                    .or_insert_with(|| Attribute::new(Value::SInt(0)));
                target.value = Value::SInt(value);
                attributes[key].listeners.clone()
            } else {
                let attr = attributes
                    .entry(key.to_string())
                    .or_insert_with(|| Attribute::new(Value::SInt(0)));
                attr.value = Value::SInt(value);
                attr.listeners.clone()
            }
        };
        for listener in listeners {
            listener.ssize_value_changed(key, value);
        }
        Ok(())
    }

    /// Stores a float, then notifies the key's listeners.
    pub fn set_float(&self, key: &str, value: f64) -> Result<(), ConfigError> {
        let listeners = {
            let mut attributes = self.attributes.lock().unwrap();
            validate(&attributes, key, |v| v.validate_float(key, value))?;
            let attr = attributes
                .entry(key.to_string())
                .or_insert_with(|| Attribute::new(Value::Float(0.0)));
            attr.value = Value::Float(value);
            attr.listeners.clone()
        };
        for listener in listeners {
            listener.float_value_changed(key, value);
        }
        Ok(())
    }

    /// Stores a string, then notifies the key's listeners.
    pub fn set_string(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let listeners = {
            let mut attributes = self.attributes.lock().unwrap();
            validate(&attributes, key, |v| v.validate_string(key, value))?;
            let attr = attributes
                .entry(key.to_string())
                .or_insert_with(|| Attribute::new(Value::String(String::new())));
            attr.value = Value::String(value.to_string());
            attr.listeners.clone()
        };
        for listener in listeners {
            listener.string_value_changed(key, value);
        }
        Ok(())
    }

    /// Appends a change listener for `key`. No-op when the key is absent.
    pub fn add_value_changed_listener(&self, key: &str, listener: Arc<dyn ValueChangedListener>) {
        let mut attributes = self.attributes.lock().unwrap();
        if let Some(attr) = attributes.get_mut(key) {
            attr.listeners.push(listener);
        }
    }

    /// Installs or replaces `key`'s validator, returning the previous one.
    ///
    /// When the key is absent nothing is installed and the given validator
    /// is dropped.
    pub fn set_value_validator(
        &self,
        key: &str,
        validator: Box<dyn ValueChangedValidator>,
    ) -> Option<Box<dyn ValueChangedValidator>> {
        let mut attributes = self.attributes.lock().unwrap();
        match attributes.get_mut(key) {
            Some(attr) => attr.validator.replace(validator),
            None => None,
        }
    }

    /// Applies a `key1=value1;key2=value2` configuration string.
    ///
    /// Items are typed by the current schema plus the `cache_size` alias
    /// and the `config_file` pseudo-key (expanded during parsing). Each
    /// found item goes through the corresponding `set_*`, so validators
    /// and listeners engage exactly as for direct sets.
    pub fn parse_configuration(&self, text: &str) -> Result<(), ConfigError> {
        let schema = {
            let attributes = self.attributes.lock().unwrap();
            let mut schema: BTreeMap<String, ValueKind> = attributes
                .iter()
                .map(|(key, attr)| (key.clone(), attr.value.kind()))
                .collect();
            // No schema entry of its own yet; typed as an integer item.
            schema.insert("cache_size".to_string(), ValueKind::UInt);
            schema.insert("config_file".to_string(), ValueKind::ConfigFile);
            schema
        };

        let items = parser::parse_items(text, &schema, 0)?;
        debug!(items = items.len(), "applying parsed configuration");
        for item in items {
            match item.value {
                Value::Bool(v) => self.set_bool(&item.key, v)?,
                Value::UInt(v) => self.set_integer(&item.key, v)?,
                Value::SInt(v) => self.set_signed_integer(&item.key, v)?,
                Value::Float(v) => self.set_float(&item.key, v)?,
                Value::String(ref v) => self.set_string(&item.key, v)?,
                Value::ConfigFile => {
                    return Err(ConfigError::InvariantViolation(format!(
                        "config_file entry '{}' survived parsing",
                        item.key
                    )))
                }
            }
        }
        Ok(())
    }

    /// Emits `ep_<key> = <value>` for every attribute, in stored order.
    ///
    /// Booleans render as `true`/`false`; config-file markers are omitted.
    pub fn add_stats<F: FnMut(&str, &str)>(&self, mut add_stat: F) {
        let snapshot: Vec<(String, String)> = {
            let attributes = self.attributes.lock().unwrap();
            attributes
                .iter()
                .filter(|(_, attr)| attr.value.kind() != ValueKind::ConfigFile)
                .map(|(key, attr)| (format!("ep_{}", key), attr.value.to_string()))
                .collect()
        };
        for (key, value) in &snapshot {
            add_stat(key, value);
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_mismatch(key: &str, expected: ValueKind, actual: &Value) -> ConfigError {
    ConfigError::KindMismatch {
        key: key.to_string(),
        expected,
        actual: actual.kind(),
    }
}

fn validate<F>(
    attributes: &BTreeMap<String, Attribute>,
    key: &str,
    check: F,
) -> Result<(), ConfigError>
where
    F: FnOnce(&dyn ValueChangedValidator) -> Result<(), String>,
{
    if let Some(attr) = attributes.get(key) {
        if let Some(validator) = &attr.validator {
            check(validator.as_ref()).map_err(|reason| ConfigError::ValidationError {
                key: key.to_string(),
                reason,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::listener::SizeRangeValidator;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    #[test]
    fn defaults_are_loaded() {
        let config = Configuration::new();
        assert_eq!(config.get_integer("max_size").unwrap(), 0);
        assert!(config.get_bool("warmup").unwrap());
        assert_eq!(config.get_string("backend").unwrap(), "couchstore");
        assert_eq!(
            config.get_signed_integer("replication_throttle_queue_cap").unwrap(),
            -1
        );
    }

    #[test]
    fn absent_keys_read_as_zero() {
        let config = Configuration::new();
        assert_eq!(config.get_integer("no_such_key").unwrap(), 0);
        assert!(!config.get_bool("no_such_key").unwrap());
        assert_eq!(config.get_float("no_such_key").unwrap(), 0.0);
        assert_eq!(config.get_string("no_such_key").unwrap(), "");
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let config = Configuration::new();
        let err = config.get_bool("max_size").unwrap_err();
        match err {
            ConfigError::KindMismatch {
                key,
                expected,
                actual,
            } => {
                assert_eq!(key, "max_size");
                assert_eq!(expected, ValueKind::Bool);
                assert_eq!(actual, ValueKind::UInt);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let config = Configuration::new();
        config.set_integer("max_size", 1_048_576).unwrap();
        assert_eq!(config.get_integer("max_size").unwrap(), 1_048_576);

        config.set_bool("warmup", false).unwrap();
        assert!(!config.get_bool("warmup").unwrap());

        config.set_float("mutation_mem_threshold", 0.5).unwrap();
        assert_eq!(config.get_float("mutation_mem_threshold").unwrap(), 0.5);

        config.set_string("dbname", "/data/b1").unwrap();
        assert_eq!(config.get_string("dbname").unwrap(), "/data/b1");
    }

    #[test]
    fn set_creates_unknown_keys() {
        let config = Configuration::new();
        config.set_integer("brand_new_key", 9).unwrap();
        assert_eq!(config.get_integer("brand_new_key").unwrap(), 9);
    }

    #[test]
    fn cache_size_alias_updates_max_size_only() {
        let config = Configuration::new();
        config.set_integer("cache_size", 4096).unwrap();
        assert_eq!(config.get_integer("max_size").unwrap(), 4096);
        // The alias itself stays readable as its default zero.
        assert_eq!(config.get_integer("cache_size").unwrap(), 0);
    }

    #[test]
    fn listeners_fire_in_insertion_order_with_new_value() {
        struct OrderListener {
            tag: u64,
            log: Arc<Mutex<Vec<(u64, u64)>>>,
        }
        impl ValueChangedListener for OrderListener {
            fn size_value_changed(&self, _key: &str, value: u64) {
                self.log.lock().unwrap().push((self.tag, value));
            }
        }

        let config = Configuration::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in [1, 2, 3] {
            config.add_value_changed_listener(
                "max_size",
                Arc::new(OrderListener {
                    tag,
                    log: Arc::clone(&log),
                }),
            );
        }
        config.set_integer("max_size", 77).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![(1, 77), (2, 77), (3, 77)]);
    }

    #[test]
    fn listener_observes_stored_value() {
        struct ReadBack {
            config: Arc<Configuration>,
            seen: AtomicU64,
        }
        impl ValueChangedListener for ReadBack {
            fn size_value_changed(&self, key: &str, _value: u64) {
                // Re-entering the registry is legal: the lock is released
                // before listeners run.
                self.seen
                    .store(self.config.get_integer(key).unwrap(), Ordering::SeqCst);
            }
        }

        let config = Arc::new(Configuration::new());
        let listener = Arc::new(ReadBack {
            config: Arc::clone(&config),
            seen: AtomicU64::new(0),
        });
        config.add_value_changed_listener(
            "max_size",
            Arc::clone(&listener) as Arc<dyn ValueChangedListener>,
        );
        config.set_integer("max_size", 123).unwrap();
        assert_eq!(listener.seen.load(Ordering::SeqCst), 123);
    }

    #[test]
    fn listener_on_absent_key_is_dropped() {
        struct Counting(AtomicUsize);
        impl ValueChangedListener for Counting {
            fn size_value_changed(&self, _key: &str, _value: u64) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let config = Configuration::new();
        let listener = Arc::new(Counting(AtomicUsize::new(0)));
        config.add_value_changed_listener(
            "never_seen_key",
            Arc::clone(&listener) as Arc<dyn ValueChangedListener>,
        );
        config.set_integer("never_seen_key", 1).unwrap();
        assert_eq!(listener.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejected_set_leaves_value_and_listeners_untouched() {
        struct Counting(AtomicUsize);
        impl ValueChangedListener for Counting {
            fn size_value_changed(&self, _key: &str, _value: u64) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let config = Configuration::new();
        config.set_integer("max_size", 100).unwrap();
        config.set_value_validator("max_size", Box::new(SizeRangeValidator::new(1, u64::MAX)));
        let listener = Arc::new(Counting(AtomicUsize::new(0)));
        config.add_value_changed_listener(
            "max_size",
            Arc::clone(&listener) as Arc<dyn ValueChangedListener>,
        );

        let err = config.set_integer("max_size", 0).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert_eq!(config.get_integer("max_size").unwrap(), 100);
        assert_eq!(listener.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn validator_replacement_returns_previous() {
        let config = Configuration::new();
        assert!(config
            .set_value_validator("max_size", Box::new(SizeRangeValidator::new(0, 10)))
            .is_none());
        assert!(config
            .set_value_validator("max_size", Box::new(SizeRangeValidator::new(0, 20)))
            .is_some());
        // Unknown key: nothing installed.
        assert!(config
            .set_value_validator("no_such_key", Box::new(SizeRangeValidator::new(0, 1)))
            .is_none());
    }

    #[test]
    fn wrong_kind_set_is_vetoed_by_validator() {
        let config = Configuration::new();
        config.set_value_validator("max_size", Box::new(SizeRangeValidator::new(0, 10)));
        // A size validator rejects bool sets against its key.
        let err = config.set_bool("max_size", true).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn stats_render_in_stored_order() {
        let config = Configuration::new();
        config.set_integer("max_size", 2048).unwrap();

        let mut stats = Vec::new();
        config.add_stats(|key, value| stats.push((key.to_string(), value.to_string())));

        let keys: Vec<&str> = stats.iter().map(|(k, _)| k.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "stored order is sorted key order");

        assert!(stats.contains(&("ep_max_size".to_string(), "2048".to_string())));
        assert!(stats.contains(&("ep_warmup".to_string(), "true".to_string())));
        assert!(!stats.iter().any(|(k, _)| k == "ep_config_file"));
    }
}
