//! Best-effort sagas across downstream services.
//!
//! A [`Saga`] runs named steps in order against a shared state. It stops at
//! the first failure and reports every step: what succeeded (with the id it
//! produced), what failed and why, what was skipped because the request did
//! not ask for it, and what never ran. Nothing is compensated; identifiers of
//! completed steps are always returned so the caller can reconcile.
//!
//! A deadline is checked before each step starts and bounds the step while it
//! runs. A step cut off by the deadline is reported as failed.

pub mod sale_checkout;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use service_core::grpc::{code_name, Status};
use thiserror::Error;
use tokio::time::Instant;

/// What a step produced when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step ran and created or updated the entity with this id.
    Done(String),
    /// The request does not call for this step.
    Skipped,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct StepError {
    pub code: String,
    pub message: String,
}

impl StepError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn deadline_exceeded(step: &str) -> Self {
        Self::new(
            "deadline_exceeded",
            format!("request deadline reached during {}", step),
        )
    }
}

impl From<Status> for StepError {
    fn from(status: Status) -> Self {
        Self::new(code_name(status.code()), status.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// Never attempted because an earlier step failed.
    Pending,
    Succeeded { id: String },
    Failed { error: String, code: String },
    Skipped,
}

impl StepStatus {
    fn label(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Succeeded { .. } => "succeeded",
            StepStatus::Failed { .. } => "failed",
            StepStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    #[serde(flatten)]
    pub status: StepStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    Completed,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SagaReport {
    pub saga: &'static str,
    pub steps: Vec<StepReport>,
}

impl SagaReport {
    pub fn status(&self) -> SagaStatus {
        if self.failed_step().is_some() {
            SagaStatus::Partial
        } else {
            SagaStatus::Completed
        }
    }

    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|report| matches!(report.status, StepStatus::Failed { .. }))
    }

    pub fn step(&self, name: &str) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|report| report.step == name)
            .map(|report| &report.status)
    }
}

/// One step of a saga, operating on the saga's accumulated state.
#[async_trait]
pub trait SagaStep<S: Send>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, state: &mut S) -> Result<StepOutcome, StepError>;
}

pub struct Saga<S: Send> {
    name: &'static str,
    steps: Vec<Box<dyn SagaStep<S>>>,
}

impl<S: Send> Saga<S> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl SagaStep<S> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run the steps in order until one fails or the deadline passes.
    pub async fn run(&self, state: &mut S, deadline: Option<Instant>) -> SagaReport {
        let mut reports = Vec::with_capacity(self.steps.len());
        let mut failed = false;

        for step in &self.steps {
            let name = step.name();

            let status = if failed {
                StepStatus::Pending
            } else {
                let result = match deadline {
                    Some(deadline) if Instant::now() >= deadline => {
                        Err(StepError::deadline_exceeded(name))
                    }
                    Some(deadline) => tokio::time::timeout_at(deadline, step.execute(state))
                        .await
                        .unwrap_or_else(|_| Err(StepError::deadline_exceeded(name))),
                    None => step.execute(state).await,
                };

                match result {
                    Ok(StepOutcome::Done(id)) => {
                        tracing::info!(saga = self.name, step = name, id = %id, "Saga step succeeded");
                        StepStatus::Succeeded { id }
                    }
                    Ok(StepOutcome::Skipped) => {
                        tracing::debug!(saga = self.name, step = name, "Saga step skipped");
                        StepStatus::Skipped
                    }
                    Err(err) => {
                        tracing::warn!(
                            saga = self.name,
                            step = name,
                            code = %err.code,
                            error = %err.message,
                            "Saga step failed, stopping"
                        );
                        failed = true;
                        StepStatus::Failed {
                            error: err.message,
                            code: err.code,
                        }
                    }
                }
            };

            counter!(
                "gateway_saga_steps_total",
                "saga" => self.name,
                "step" => name,
                "outcome" => status.label()
            )
            .increment(1);

            reports.push(StepReport { step: name, status });
        }

        SagaReport {
            saga: self.name,
            steps: reports,
        }
    }
}
