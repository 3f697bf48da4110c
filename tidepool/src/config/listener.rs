//! Change listeners and value validators.
//!
//! Both are attached per key. Validators run under the registry lock and
//! veto a set before it is stored; listeners are notified after the lock is
//! released, in the order they were added.

/// Observer of configuration changes for one key.
///
/// One callback per value kind; the default implementations ignore the
/// change, so a listener only overrides the kinds it cares about.
///
/// # Thread safety
///
/// Callbacks arrive on whatever thread performed the `set`, never while
/// the registry lock is held.
pub trait ValueChangedListener: Send + Sync {
    fn boolean_value_changed(&self, key: &str, value: bool) {
        let _ = (key, value);
    }

    fn size_value_changed(&self, key: &str, value: u64) {
        let _ = (key, value);
    }

    fn ssize_value_changed(&self, key: &str, value: i64) {
        let _ = (key, value);
    }

    fn float_value_changed(&self, key: &str, value: f64) {
        let _ = (key, value);
    }

    fn string_value_changed(&self, key: &str, value: &str) {
        let _ = (key, value);
    }
}

/// Vetoes bad values before they are stored.
///
/// The defaults reject every kind, so a validator built for one kind
/// automatically rejects sets of the wrong kind against its key.
pub trait ValueChangedValidator: Send + Sync {
    fn validate_bool(&self, key: &str, value: bool) -> Result<(), String> {
        let _ = value;
        Err(unsupported(key, "bool"))
    }

    fn validate_size(&self, key: &str, value: u64) -> Result<(), String> {
        let _ = value;
        Err(unsupported(key, "unsigned integer"))
    }

    fn validate_ssize(&self, key: &str, value: i64) -> Result<(), String> {
        let _ = value;
        Err(unsupported(key, "signed integer"))
    }

    fn validate_float(&self, key: &str, value: f64) -> Result<(), String> {
        let _ = value;
        Err(unsupported(key, "float"))
    }

    fn validate_string(&self, key: &str, value: &str) -> Result<(), String> {
        let _ = value;
        Err(unsupported(key, "string"))
    }
}

fn unsupported(key: &str, kind: &str) -> String {
    format!("{} values are not accepted for '{}'", kind, key)
}

/// Accepts unsigned integers within `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct SizeRangeValidator {
    lower: u64,
    upper: u64,
}

impl SizeRangeValidator {
    pub fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }
}

impl ValueChangedValidator for SizeRangeValidator {
    fn validate_size(&self, _key: &str, value: u64) -> Result<(), String> {
        if value < self.lower || value > self.upper {
            Err(format!(
                "value {} is outside the range [{}, {}]",
                value, self.lower, self.upper
            ))
        } else {
            Ok(())
        }
    }
}

/// Accepts signed integers within `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct SSizeRangeValidator {
    lower: i64,
    upper: i64,
}

impl SSizeRangeValidator {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }
}

impl ValueChangedValidator for SSizeRangeValidator {
    fn validate_ssize(&self, _key: &str, value: i64) -> Result<(), String> {
        if value < self.lower || value > self.upper {
            Err(format!(
                "value {} is outside the range [{}, {}]",
                value, self.lower, self.upper
            ))
        } else {
            Ok(())
        }
    }
}

/// Accepts floats within `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct FloatRangeValidator {
    lower: f64,
    upper: f64,
}

impl FloatRangeValidator {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

impl ValueChangedValidator for FloatRangeValidator {
    fn validate_float(&self, _key: &str, value: f64) -> Result<(), String> {
        if value < self.lower || value > self.upper {
            Err(format!(
                "value {} is outside the range [{}, {}]",
                value, self.lower, self.upper
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_range_accepts_bounds() {
        let validator = SizeRangeValidator::new(1, 10);
        assert!(validator.validate_size("k", 1).is_ok());
        assert!(validator.validate_size("k", 10).is_ok());
        assert!(validator.validate_size("k", 0).is_err());
        assert!(validator.validate_size("k", 11).is_err());
    }

    #[test]
    fn ssize_range_handles_negatives() {
        let validator = SSizeRangeValidator::new(-1, 100);
        assert!(validator.validate_ssize("k", -1).is_ok());
        assert!(validator.validate_ssize("k", -2).is_err());
    }

    #[test]
    fn float_range_checks_bounds() {
        let validator = FloatRangeValidator::new(0.0, 1.0);
        assert!(validator.validate_float("k", 0.93).is_ok());
        assert!(validator.validate_float("k", 1.5).is_err());
    }

    #[test]
    fn wrong_kind_is_rejected_by_default() {
        let validator = SizeRangeValidator::new(0, 10);
        let err = validator.validate_bool("some_key", true).unwrap_err();
        assert!(err.contains("some_key"));
    }
}
