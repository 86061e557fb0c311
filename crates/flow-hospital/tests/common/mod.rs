//! Simulated workflow engine used by the integration tests.
//!
//! Runs an instance body, reports failures to the hospital, and acts on the
//! returned directive the way a checkpointing engine would.

#![allow(dead_code)]

use flow_hospital::FlowHospital;
use flow_hospital_types::{
    flow_error, CheckpointState, Directive, FlowError, FlowFailure, FlowId, PersistenceError,
    WorkflowType,
};

/// Hard stop for runaway retry loops.
pub const MAX_EXECUTIONS: u32 = 1_000;

/// How a simulated run ended.
#[derive(Debug, Clone)]
pub enum RunEnd {
    Completed,
    Propagated(Vec<FlowError>),
    Parked,
    /// The hospital returned an error instead of a directive.
    HospitalFailed(String),
    /// [`MAX_EXECUTIONS`] reached without a terminal directive.
    Runaway,
}

/// Summary of one simulated run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub executions: u32,
    pub end: RunEnd,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        matches!(self.end, RunEnd::Completed)
    }

    pub fn propagated(&self) -> bool {
        matches!(self.end, RunEnd::Propagated(_))
    }

    pub fn parked(&self) -> bool {
        matches!(self.end, RunEnd::Parked)
    }
}

/// A workflow instance pinned to one checkpoint.
///
/// `body` is called with the 1-based execution number and either succeeds or
/// fails with the errors the instance raised.
pub struct SimulatedFlow<F>
where
    F: FnMut(u32) -> Result<(), Vec<FlowError>>,
{
    pub flow_id: FlowId,
    pub state: CheckpointState,
    body: F,
}

impl<F> SimulatedFlow<F>
where
    F: FnMut(u32) -> Result<(), Vec<FlowError>>,
{
    pub fn new(state: CheckpointState, body: F) -> Self {
        Self {
            flow_id: FlowId::generate(),
            state,
            body,
        }
    }

    /// Execute until the instance completes, propagates or parks.
    pub fn run(&mut self, hospital: &dyn FlowHospital) -> RunReport {
        let mut executions = 0;
        loop {
            if executions >= MAX_EXECUTIONS {
                return RunReport {
                    executions,
                    end: RunEnd::Runaway,
                };
            }
            executions += 1;

            let errors = match (self.body)(executions) {
                Ok(()) => {
                    hospital.notify_completed(&self.flow_id);
                    return RunReport {
                        executions,
                        end: RunEnd::Completed,
                    };
                }
                Err(errors) => errors,
            };

            match hospital.notify_failure(&self.flow_id, &self.state, &errors) {
                Ok(Directive::RetryFromCheckpoint) => continue,
                Ok(Directive::Park) => {
                    return RunReport {
                        executions,
                        end: RunEnd::Parked,
                    }
                }
                Ok(Directive::Propagate) => {
                    hospital.notify_completed(&self.flow_id);
                    return RunReport {
                        executions,
                        end: RunEnd::Propagated(errors),
                    };
                }
                Err(e) => {
                    hospital.notify_completed(&self.flow_id);
                    return RunReport {
                        executions,
                        end: RunEnd::HospitalFailed(e.to_string()),
                    };
                }
            }
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn payment_state(suspend_count: u32) -> CheckpointState {
    CheckpointState::new(WorkflowType::new("payment"), suspend_count)
}

/// Duplicate primary key wrapped the way workflow code surfaces it.
pub fn duplicate_insert() -> Vec<FlowError> {
    vec![flow_error(FlowFailure::caused_by(
        "failed to record transaction",
        PersistenceError::constraint_violation(
            "pk_transactions",
            "duplicate key value violates unique constraint",
        ),
    ))]
}

pub fn deadlock() -> Vec<FlowError> {
    vec![flow_error(FlowFailure::caused_by(
        "flush failed",
        PersistenceError::sql("deadlock detected"),
    ))]
}

pub fn application_bug() -> Vec<FlowError> {
    vec![flow_error(FlowFailure::new("index out of range"))]
}
