//! Step tracing.
//!
//! Wraps page-object operations so that each one logs its entry, completion
//! or failure, runs inside a `tracing` span and leaves a [`StepRecord`] for
//! the scenario report. Errors are re-raised unchanged.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::E2eResult;
use crate::soft::SoftHandle;

/// Status of a traced step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step is running
    Running,
    /// Step completed successfully
    Ok,
    /// Step completed with error
    Error,
    /// Step future was dropped before finishing
    Cancelled,
}

/// One traced step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Sequence number
    pub id: usize,
    /// Enclosing step, if nested
    pub parent_id: Option<usize>,
    /// Step title
    pub title: String,
    /// Start offset from the tracer's creation
    pub start: Duration,
    /// Time the step took
    pub duration: Option<Duration>,
    /// Final status
    pub status: StepStatus,
    /// Error message for failed steps
    pub error: Option<String>,
}

#[derive(Debug)]
struct TracerState {
    origin: Instant,
    steps: Vec<StepRecord>,
    open: Vec<usize>,
}

/// Records steps for one scenario. Cheap to clone; clones share the log.
#[derive(Debug, Clone)]
pub struct Tracer {
    state: Arc<Mutex<TracerState>>,
    soft: Option<SoftHandle>,
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer {
    /// Create an empty tracer
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TracerState {
                origin: Instant::now(),
                steps: Vec::new(),
                open: Vec::new(),
            })),
            soft: None,
        }
    }

    /// Attribute soft failures to the step that is running
    #[must_use]
    pub fn with_soft(mut self, soft: SoftHandle) -> Self {
        self.soft = Some(soft);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TracerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `operation` as a named step.
    pub async fn step<T, Fut>(&self, title: &str, operation: Fut) -> E2eResult<T>
    where
        Fut: Future<Output = E2eResult<T>>,
    {
        let mut guard = self.begin(title);
        tracing::info!("=== Step: {title} ===");

        let span = tracing::info_span!("step", title = %title, id = guard.id);
        let result = operation.instrument(span).await;

        match result {
            Ok(ref _value) => {
                tracing::info!("=== Step: {title} - Completed ===");
                guard.finish(StepStatus::Ok, None);
            }
            Err(ref err) => {
                tracing::error!(error = %err, "=== Step: {title} - Failed ===");
                guard.finish(StepStatus::Error, Some(err.to_string()));
            }
        }
        result
    }

    fn begin(&self, title: &str) -> StepGuard<'_> {
        let id = {
            let mut state = self.lock();
            let id = state.steps.len();
            let start = state.origin.elapsed();
            let parent_id = state.open.last().copied();
            state.steps.push(StepRecord {
                id,
                parent_id,
                title: title.to_string(),
                start,
                duration: None,
                status: StepStatus::Running,
                error: None,
            });
            state.open.push(id);
            id
        };
        if let Some(ref soft) = self.soft {
            soft.set_step(Some(title.to_string()));
        }
        StepGuard {
            tracer: self,
            id,
            finished: false,
        }
    }

    fn end(&self, id: usize, status: StepStatus, error: Option<String>) {
        let parent_title = {
            let mut state = self.lock();
            let now = state.origin.elapsed();
            if let Some(record) = state.steps.get_mut(id) {
                record.duration = Some(now.saturating_sub(record.start));
                record.status = status;
                record.error = error;
            }
            state.open.retain(|open| *open != id);
            state
                .open
                .last()
                .and_then(|parent| state.steps.get(*parent))
                .map(|record| record.title.clone())
        };
        if let Some(ref soft) = self.soft {
            soft.set_step(parent_title);
        }
    }

    /// Snapshot of every step recorded so far
    #[must_use]
    pub fn steps(&self) -> Vec<StepRecord> {
        self.lock().steps.clone()
    }

    /// Steps that failed
    #[must_use]
    pub fn failed_steps(&self) -> Vec<StepRecord> {
        self.lock()
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Error)
            .cloned()
            .collect()
    }

    /// Export the step log as JSON
    pub fn to_json(&self) -> E2eResult<String> {
        Ok(serde_json::to_string_pretty(&self.steps())?)
    }
}

struct StepGuard<'a> {
    tracer: &'a Tracer,
    id: usize,
    finished: bool,
}

impl StepGuard<'_> {
    fn finish(&mut self, status: StepStatus, error: Option<String>) {
        self.finished = true;
        self.tracer.end(self.id, status, error);
    }
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(id = self.id, "step dropped before completion");
            self.tracer.end(self.id, StepStatus::Cancelled, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;

    #[tokio::test(start_paused = true)]
    async fn test_completed_step_recorded() {
        let tracer = Tracer::new();
        let value = tracer
            .step("Open login modal", async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let steps = tracer.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "Open login modal");
        assert_eq!(steps[0].status, StepStatus::Ok);
        assert_eq!(steps[0].duration, Some(Duration::from_millis(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_step_reraises_same_error() {
        let tracer = Tracer::new();
        let err = tracer
            .step("Add product to cart", async {
                Err::<(), _>(E2eError::Timeout {
                    waiting_for: "native dialog".to_string(),
                    ms: 20_000,
                })
            })
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let failed = tracer.failed_steps();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error.as_deref().unwrap().contains("native dialog"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_steps_have_parent() {
        let tracer = Tracer::new();
        let inner = tracer.clone();
        tracer
            .step("Login", async move {
                inner.step("Fill username", async { Ok(()) }).await
            })
            .await
            .unwrap();
        let steps = tracer.steps();
        assert_eq!(steps[1].parent_id, Some(0));
        assert_eq!(steps[0].parent_id, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_failures_attributed_to_running_step() {
        let soft = SoftHandle::new();
        let tracer = Tracer::new().with_soft(soft.clone());
        let inner_soft = soft.clone();
        tracer
            .step("Verify cart total", async move {
                inner_soft.assert_eq(&790.0, &1150.0, "cart total");
                Ok(())
            })
            .await
            .unwrap();
        soft.assert_true(false, "after the step");
        let failures = soft.failures();
        assert_eq!(failures[0].step.as_deref(), Some("Verify cart total"));
        assert_eq!(failures[1].step, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_step_is_cancelled() {
        let tracer = Tracer::new();
        let fut = tracer.step("Slow", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        let timed = tokio::time::timeout(Duration::from_secs(1), fut).await;
        assert!(timed.is_err());
        assert_eq!(tracer.steps()[0].status, StepStatus::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_export() {
        let tracer = Tracer::new();
        tracer.step("One", async { Ok(()) }).await.unwrap();
        assert!(tracer.to_json().unwrap().contains("\"One\""));
    }
}
