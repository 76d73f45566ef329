//! Request message validation.
//!
//! Generated (or hand-written) message types implement [`Validatable`];
//! client and server both run validation before a call proceeds, with a
//! configurable fail-fast mode that stops at the first violation instead
//! of collecting all of them.

/// One or more constraint violations found on a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.violations.join("; "))
    }
}

/// A message whose field constraints can be checked before transcoding.
///
/// With `fail_fast` the implementation returns on the first violation;
/// otherwise it collects every violation into one error.
pub trait Validatable {
    fn validate(&self, fail_fast: bool) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Range {
        n: i32,
    }

    impl Validatable for Range {
        fn validate(&self, fail_fast: bool) -> Result<(), ValidationError> {
            let mut err = ValidationError { violations: vec![] };
            if self.n < 0 {
                err.push("n must be non-negative");
                if fail_fast {
                    return Err(err);
                }
            }
            if self.n > 100 {
                err.push("n must be at most 100");
            }
            if err.violations.is_empty() {
                Ok(())
            } else {
                Err(err)
            }
        }
    }

    #[test]
    fn test_valid_message_passes() {
        assert!(Range { n: 5 }.validate(false).is_ok());
    }

    #[test]
    fn test_fail_fast_stops_at_first_violation() {
        let err = Range { n: -1 }.validate(true).unwrap_err();
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn test_display_joins_violations() {
        let err = ValidationError::new("bad");
        assert_eq!(err.to_string(), "validation failed: bad");
    }
}
