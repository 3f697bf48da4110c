//! Tagged configuration values.

use std::fmt;

/// A configuration value with its dynamic type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// Unsigned integer; sizes, counts, intervals.
    UInt(u64),
    /// Signed integer; sentinels like `-1` are meaningful.
    SInt(i64),
    Float(f64),
    String(String),
    /// Parse-only marker for the `config_file` pseudo-key. Never stored;
    /// the registry rejects it with an invariant violation.
    ConfigFile,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::UInt(_) => ValueKind::UInt,
            Value::SInt(_) => ValueKind::SInt,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::ConfigFile => ValueKind::ConfigFile,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::SInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::ConfigFile => Ok(()),
        }
    }
}

/// The tag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    UInt,
    SInt,
    Float,
    String,
    ConfigFile,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::UInt => "unsigned integer",
            ValueKind::SInt => "signed integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::ConfigFile => "config file",
        };
        f.write_str(name)
    }
}
