//! # Validation Gate
//!
//! Accumulate-then-raise precondition checking. Requirements are evaluated
//! one by one; failures are collected and reported as a single
//! [`ValidationError`] so the caller sees every violation of one operation
//! at once instead of fixing them one round-trip at a time.

use crate::errors::ValidationError;

/// Collects failed preconditions for a single operation.
#[derive(Debug, Default, Clone)]
pub struct ValidationGate {
    failures: Vec<String>,
}

impl ValidationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` if `condition` is false. Never raises.
    pub fn require(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.failures.push(message.into());
        }
        self
    }

    /// Failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Raise one aggregated error if anything failed; otherwise a no-op.
    pub fn raise_if_any(&self, prefix: &str) -> Result<(), ValidationError> {
        if self.failures.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            prefix = prefix,
            failures = self.failures.len(),
            "Validation gate rejected operation"
        );

        Err(ValidationError {
            prefix: prefix.to_string(),
            failures: self.failures.clone(),
        })
    }
}
