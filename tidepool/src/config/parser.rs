//! Configuration text parsing.
//!
//! The engine receives its configuration as a `key1=value1;key2=value2`
//! string. Each key is typed by the registry's current schema; values are
//! parsed into typed slots before any of them is applied. The pseudo-key
//! `config_file=<path>` pulls in a file of the same format, expanded here
//! so the registry itself never sees a config-file item.

use super::registry::ConfigError;
use super::value::{Value, ValueKind};
use std::collections::BTreeMap;
use std::fs;

/// Config files may reference one further file, not chains of them.
const MAX_CONFIG_FILE_DEPTH: usize = 1;

/// One parsed `key=value` item with its typed slot filled.
#[derive(Debug)]
pub(crate) struct ParsedItem {
    pub key: String,
    pub value: Value,
}

/// Parses `text` against `schema`, expanding `config_file` references.
pub(crate) fn parse_items(
    text: &str,
    schema: &BTreeMap<String, ValueKind>,
    depth: usize,
) -> Result<Vec<ParsedItem>, ConfigError> {
    let mut items = Vec::new();
    for segment in text.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, raw) = segment
            .split_once('=')
            .ok_or_else(|| ConfigError::Parse(format!("expected key=value, got '{}'", segment)))?;
        let key = key.trim();
        let raw = raw.trim();
        let kind = *schema
            .get(key)
            .ok_or_else(|| ConfigError::Parse(format!("unknown configuration key '{}'", key)))?;

        if kind == ValueKind::ConfigFile {
            if depth >= MAX_CONFIG_FILE_DEPTH {
                return Err(ConfigError::Parse(format!(
                    "config_file '{}' nests deeper than {} level",
                    raw, MAX_CONFIG_FILE_DEPTH
                )));
            }
            let contents = fs::read_to_string(raw).map_err(|e| {
                ConfigError::Parse(format!("cannot read config_file '{}': {}", raw, e))
            })?;
            items.extend(parse_items(&contents, schema, depth + 1)?);
            continue;
        }

        items.push(ParsedItem {
            key: key.to_string(),
            value: parse_value(key, kind, raw)?,
        });
    }
    Ok(items)
}

fn parse_value(key: &str, kind: ValueKind, raw: &str) -> Result<Value, ConfigError> {
    let bad = |detail: &str| ConfigError::Parse(format!("key '{}': {}", key, detail));
    match kind {
        ValueKind::Bool => match raw {
            "true" | "1" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "off" => Ok(Value::Bool(false)),
            _ => Err(bad(&format!("'{}' is not a bool", raw))),
        },
        ValueKind::UInt => raw
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|_| bad(&format!("'{}' is not an unsigned integer", raw))),
        ValueKind::SInt => raw
            .parse::<i64>()
            .map(Value::SInt)
            .map_err(|_| bad(&format!("'{}' is not a signed integer", raw))),
        ValueKind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| bad(&format!("'{}' is not a float", raw))),
        ValueKind::String => Ok(Value::String(raw.to_string())),
        // Handled by expansion above; reaching here is a programmer error.
        ValueKind::ConfigFile => Err(ConfigError::InvariantViolation(format!(
            "config_file item '{}' reached value parsing",
            key
        ))),
    }
}
