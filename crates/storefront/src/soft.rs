//! Soft assertions.
//!
//! Collect assertion failures without stopping the running scenario. Page
//! objects record into a shared [`SoftHandle`]; the scenario session turns
//! the collected failures into an error once the scenario ends.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// A single assertion failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// Message describing the failure
    pub message: String,
    /// Step that was running when the assertion failed
    pub step: Option<String>,
    /// Timestamp when the failure occurred
    #[serde(skip)]
    pub timestamp: Option<Instant>,
    /// Index of this assertion in the sequence
    pub index: usize,
}

impl AssertionFailure {
    /// Create a new assertion failure
    #[must_use]
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self {
            message: message.into(),
            step: None,
            timestamp: Some(Instant::now()),
            index,
        }
    }

    /// Attach the step name
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

/// Soft assertions collector
///
/// ```ignore
/// let mut soft = SoftAssertions::new();
/// soft.assert_eq(&1, &2, "cart count");
/// soft.assert_true(false, "logout visible");
/// assert_eq!(soft.verify().unwrap_err().count, 2);
/// ```
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
    assertion_count: usize,
    current_step: Option<String>,
}

impl SoftAssertions {
    /// Create a new soft assertions collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert two values are equal
    pub fn assert_eq<T: PartialEq + Debug>(&mut self, actual: &T, expected: &T, message: &str) {
        self.assertion_count += 1;
        if actual != expected {
            self.record_failure(format!("{message}: expected {expected:?}, got {actual:?}"));
        }
    }

    /// Assert a condition is true
    pub fn assert_true(&mut self, condition: bool, message: &str) {
        self.assertion_count += 1;
        if !condition {
            self.record_failure(format!("{message}: expected true, got false"));
        }
    }

    /// Assert a condition is false
    pub fn assert_false(&mut self, condition: bool, message: &str) {
        self.assertion_count += 1;
        if condition {
            self.record_failure(format!("{message}: expected false, got true"));
        }
    }

    /// Assert a string contains a substring
    pub fn assert_contains(&mut self, haystack: &str, needle: &str, message: &str) {
        self.assertion_count += 1;
        if !haystack.contains(needle) {
            self.record_failure(format!(
                "{message}: expected '{haystack}' to contain '{needle}'"
            ));
        }
    }

    /// Assert a string is not empty
    pub fn assert_not_empty(&mut self, value: &str, message: &str) {
        self.assertion_count += 1;
        if value.is_empty() {
            self.record_failure(format!("{message}: expected a non-empty string"));
        }
    }

    /// Record a custom failure
    pub fn fail(&mut self, message: impl Into<String>) {
        self.assertion_count += 1;
        self.record_failure(message.into());
    }

    /// Set the step that subsequent failures are attributed to
    pub fn set_step(&mut self, step: Option<String>) {
        self.current_step = step;
    }

    fn record_failure(&mut self, message: String) {
        tracing::warn!(step = ?self.current_step, "soft assertion failed: {message}");
        let mut failure = AssertionFailure::new(message, self.failures.len());
        if let Some(ref step) = self.current_step {
            failure = failure.with_step(step.clone());
        }
        self.failures.push(failure);
    }

    /// Get all failures
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Get the number of failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Get the total number of assertions checked
    #[must_use]
    pub const fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Check if all assertions passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Verify all assertions passed, returning error if any failed
    pub fn verify(&self) -> Result<(), SoftAssertionError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(SoftAssertionError::new(&self.failures))
        }
    }

    /// Clear all recorded failures
    pub fn clear(&mut self) {
        self.failures.clear();
        self.assertion_count = 0;
    }

    /// Get a summary of the assertions
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        AssertionSummary {
            total: self.assertion_count,
            passed: self.assertion_count - self.failures.len(),
            failed: self.failures.len(),
        }
    }
}

/// Summary of assertion results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Total assertions checked
    pub total: usize,
    /// Assertions that passed
    pub passed: usize,
    /// Assertions that failed
    pub failed: usize,
}

/// Error type for soft assertion failures
#[derive(Debug, Clone)]
pub struct SoftAssertionError {
    /// All failure messages
    pub failures: Vec<String>,
    /// Number of failed assertions
    pub count: usize,
}

impl SoftAssertionError {
    /// Create a new error from failures
    #[must_use]
    pub fn new(failures: &[AssertionFailure]) -> Self {
        Self {
            failures: failures
                .iter()
                .map(|f| match f.step {
                    Some(ref step) => format!("[{step}] {}", f.message),
                    None => f.message.clone(),
                })
                .collect(),
            count: failures.len(),
        }
    }
}

impl std::fmt::Display for SoftAssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} soft assertion(s) failed:", self.count)?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "  {}. {failure}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for SoftAssertionError {}

/// Shared handle to one scenario's soft assertions.
///
/// Every page object of a session holds a clone; all of them record into the
/// same collector.
#[derive(Debug, Clone, Default)]
pub struct SoftHandle {
    inner: Arc<Mutex<SoftAssertions>>,
}

impl SoftHandle {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure against the collector
    pub fn with<R>(&self, f: impl FnOnce(&mut SoftAssertions) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Soft equality check
    pub fn assert_eq<T: PartialEq + Debug>(&self, actual: &T, expected: &T, message: &str) {
        self.with(|soft| soft.assert_eq(actual, expected, message));
    }

    /// Soft truth check
    pub fn assert_true(&self, condition: bool, message: &str) {
        self.with(|soft| soft.assert_true(condition, message));
    }

    /// Soft falsity check
    pub fn assert_false(&self, condition: bool, message: &str) {
        self.with(|soft| soft.assert_false(condition, message));
    }

    /// Soft substring check
    pub fn assert_contains(&self, haystack: &str, needle: &str, message: &str) {
        self.with(|soft| soft.assert_contains(haystack, needle, message));
    }

    /// Soft non-empty check
    pub fn assert_not_empty(&self, value: &str, message: &str) {
        self.with(|soft| soft.assert_not_empty(value, message));
    }

    /// Record an operation's failure as soft and carry on.
    ///
    /// Returns the value on success, `None` after recording the error.
    pub fn check<T>(&self, result: E2eResult<T>, message: &str) -> Option<T> {
        match result {
            Ok(value) => {
                self.with(|soft| soft.assertion_count += 1);
                Some(value)
            }
            Err(err) => {
                self.with(|soft| soft.fail(format!("{message}: {err}")));
                None
            }
        }
    }

    /// Number of recorded failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.with(|soft| soft.failure_count())
    }

    /// Snapshot of the recorded failures
    #[must_use]
    pub fn failures(&self) -> Vec<AssertionFailure> {
        self.with(|soft| soft.failures().to_vec())
    }

    /// Verify all assertions passed
    pub fn verify(&self) -> Result<(), SoftAssertionError> {
        self.with(|soft| soft.verify())
    }

    /// Verify and convert into a suite error
    pub fn verify_e2e(&self) -> E2eResult<()> {
        self.verify().map_err(|err| E2eError::Assertion {
            message: err.to_string(),
        })
    }

    pub(crate) fn set_step(&self, step: Option<String>) {
        self.with(|soft| soft.set_step(step));
    }
}
