//! Typed, validated, listenable configuration registry.
//!
//! The engine's process-wide tunables live in a [`Configuration`]: a map
//! from key to a dynamically-tagged value (`bool`, unsigned/signed integer,
//! float, string) with an optional validator and an insertion-ordered list
//! of change listeners. Many of the keys parameterize the executor pool;
//! components subscribe to the ones they care about and react to runtime
//! changes.
//!
//! # Guarantees
//!
//! - Reads against a different tag than stored fail with
//!   [`ConfigError::KindMismatch`]; reads of absent keys return the kind's
//!   zero value.
//! - Validators run under the registry lock and reject bad values before
//!   anything is stored.
//! - Listeners are invoked **outside** the registry lock, in insertion
//!   order, observing the value stored while the lock was held.
//!
//! # Example
//!
//! ```
//! use tidepool::config::Configuration;
//!
//! let config = Configuration::new();
//! config.set_integer("max_size", 1_048_576).unwrap();
//! assert_eq!(config.get_integer("max_size").unwrap(), 1_048_576);
//! ```

mod defaults;
mod listener;
mod parser;
mod registry;
mod value;

pub use listener::{
    FloatRangeValidator, SSizeRangeValidator, SizeRangeValidator, ValueChangedListener,
    ValueChangedValidator,
};
pub use registry::{ConfigError, Configuration};
pub use value::{Value, ValueKind};
