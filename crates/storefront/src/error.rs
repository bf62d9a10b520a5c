//! Result and error types for storefront-e2e.

use std::path::PathBuf;

use thiserror::Error;

use crate::soft::SoftAssertionError;

/// Result type for suite operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving the storefront
#[derive(Debug, Error)]
pub enum E2eError {
    /// Browser executable not found or failed to start
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Any failure reported by the browser-automation collaborator
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A wait exceeded its budget
    #[error("Timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// What was being waited for
        waiting_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Element stayed disabled through every enablement poll
    #[error("{locator} did not become enabled after {attempts} attempts")]
    NotEnabled {
        /// Locator description
        locator: String,
        /// Number of polls made
        attempts: u32,
    },

    /// Element has no layout box (not rendered)
    #[error("Unable to get bounding box for {locator}")]
    BoundingBox {
        /// Locator description
        locator: String,
    },

    /// Native dialog handling failed
    #[error("Dialog error: {message}")]
    Dialog {
        /// Error message
        message: String,
    },

    /// Hard assertion failed
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Screenshot capture failed
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Fixture index past the end of a fixture file
    #[error("{kind} index {index} out of bounds. Only {available} {kind} records available.")]
    FixtureIndex {
        /// Fixture kind ("user", "checkout")
        kind: &'static str,
        /// Requested index
        index: usize,
        /// Number of records in the file
        available: usize,
    },

    /// Required fixture entry absent
    #[error("No {kind} fixture named '{name}'")]
    FixtureMissing {
        /// Fixture kind
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Scenario ended with soft and/or hard failures
    #[error("{0}")]
    ScenarioFailed(Box<ScenarioReport>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl E2eError {
    /// Wrap any displayable collaborator error
    pub fn driver(err: impl std::fmt::Display) -> Self {
        Self::Driver {
            message: err.to_string(),
        }
    }

    /// Check whether this is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check whether this error comes from broken test setup
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::FixtureIndex { .. } | Self::FixtureMissing { .. } | Self::Config { .. }
        )
    }
}

/// Everything that went wrong in one scenario
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario name
    pub scenario: String,
    /// Soft assertion failures accumulated during the run
    pub soft: Option<SoftAssertionError>,
    /// First hard failure, which aborted the scenario
    pub hard: Option<String>,
    /// Screenshot captured at the hard failure
    pub screenshot: Option<PathBuf>,
}

impl std::fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scenario '{}' failed", self.scenario)?;
        if let Some(ref hard) = self.hard {
            writeln!(f, "Hard failure: {hard}")?;
        }
        if let Some(ref shot) = self.screenshot {
            writeln!(f, "Screenshot: {}", shot.display())?;
        }
        if let Some(ref soft) = self.soft {
            write!(f, "{soft}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_index_message() {
        let err = E2eError::FixtureIndex {
            kind: "user",
            index: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "user index 3 out of bounds. Only 1 user records available."
        );
        assert!(err.is_configuration());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_predicate() {
        let err = E2eError::Timeout {
            waiting_for: "cart table".to_string(),
            ms: 20_000,
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("20000ms"));
    }

    #[test]
    fn test_report_display_lists_everything() {
        let report = ScenarioReport {
            scenario: "TC4".to_string(),
            soft: Some(SoftAssertionError {
                failures: vec!["total mismatch".to_string()],
                count: 1,
            }),
            hard: Some("Timed out".to_string()),
            screenshot: Some(PathBuf::from("shots/TC4.png")),
        };
        let text = report.to_string();
        assert!(text.contains("TC4"));
        assert!(text.contains("Hard failure: Timed out"));
        assert!(text.contains("shots/TC4.png"));
        assert!(text.contains("total mismatch"));
    }
}
