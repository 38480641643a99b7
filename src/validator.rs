use std::collections::HashMap;

/// Request-scoped accumulator of field validation errors.
///
/// Only the first error recorded for a field is kept; later errors for the
/// same field are dropped. Errors render as a JSON mapping, so there is no
/// ordering guarantee across fields.
#[derive(Debug, Default)]
pub struct Validator {
    pub errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no field has a recorded error.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record an error for a field, unless one is already recorded.
    pub fn add_error(&mut self, key: &str, message: &str) {
        self.errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record an error for a field only if the check failed.
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }
}

/// Membership test against a fixed safelist.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}
