//! # Flow Hospital - Failure Triage for Checkpointed Workflows
//!
//! When a workflow instance fails with a runtime error, the workflow engine
//! admits it to the hospital. The hospital consults its staff of
//! diagnosticians and answers with exactly one directive:
//!
//! - **Retry from checkpoint** when the failure looks transient
//! - **Park** when the workflow type needs external resolution
//! - **Propagate** when nobody recognizes the failure
//!
//! ## Key Components
//!
//! - [`TriageCoordinator`]: Runs admission cycles and owns the patient registry
//! - [`Diagnostician`]: Pluggable verdict capability, consulted in a fixed order
//! - [`ErrorClassifier`]: Recognizes failure categories along cause chains
//! - [`PatientRegistry`]: Concurrent per-instance medical histories
//!
//! ## Example
//!
//! ```rust,no_run
//! use flow_hospital::{FlowHospital, HospitalConfig, TriageCoordinator};
//! use flow_hospital_types::{
//!     flow_error, CheckpointState, Directive, FlowId, PersistenceError, WorkflowType,
//! };
//!
//! # fn example() -> flow_hospital::HospitalResult<()> {
//! let hospital = TriageCoordinator::new(HospitalConfig::default())?;
//!
//! let flow_id = FlowId::generate();
//! let state = CheckpointState::new(WorkflowType::new("payment"), 4);
//! let errors = vec![flow_error(PersistenceError::sql("deadlock detected"))];
//!
//! let directive = hospital.notify_failure(&flow_id, &state, &errors)?;
//! assert_eq!(directive, Directive::RetryFromCheckpoint);
//!
//! // The engine reports completion so the history is released
//! hospital.notify_completed(&flow_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Loop Breaking
//!
//! Duplicate-key conflicts are retried only while the same checkpoint has
//! been discharged for them at most `max_discharges` times (default 3). With
//! bound `B`, an instance failing deterministically runs `B + 2` times before
//! its error propagates.
//!
//! ## Concurrency
//!
//! Different instances are triaged in parallel. Admissions and releases of the
//! same instance are serialized on its registry entry.

#![deny(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod diagnosticians;
pub mod error;
pub mod registry;

// Re-export main types
pub use classifier::{cause_chain, ErrorCategory, ErrorClassifier, ErrorSignature, MatchScope};
pub use config::{ClassifierConfig, DuplicateInsertConfig, HospitalConfig, TerminalMarkerConfig};
pub use coordinator::{FlowHospital, ReleaseReason, TriageCoordinator, TriageEvent, TriageOutcome};
pub use diagnosticians::{
    Diagnostician, DuplicateInsertDiagnostician, Staff, StaticDiagnostician,
    TerminalMarkerDiagnostician, TransientContentionDiagnostician,
};
pub use error::{HospitalError, HospitalResult};
pub use registry::PatientRegistry;

#[cfg(test)]
mod tests {
    use super::*;
    use flow_hospital_types::{
        flow_error, CheckpointState, Directive, FlowId, PersistenceError, WorkflowType,
    };

    #[test]
    fn test_hospital_integration() {
        let hospital = TriageCoordinator::new(HospitalConfig::default()).unwrap();
        let flow_id = FlowId::generate();
        let state = CheckpointState::new(WorkflowType::new("payment"), 4);
        let errors = vec![flow_error(PersistenceError::sql("deadlock detected"))];

        let directive = hospital.notify_failure(&flow_id, &state, &errors).unwrap();
        assert_eq!(directive, Directive::RetryFromCheckpoint);
        assert_eq!(hospital.patient_count(), 1);

        hospital.notify_completed(&flow_id);
        assert_eq!(hospital.patient_count(), 0);
    }

    #[test]
    fn test_standard_staff_ids() {
        let hospital = TriageCoordinator::new(HospitalConfig::default()).unwrap();
        let ids: Vec<String> = hospital
            .diagnostician_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["transient-contention", "duplicate-insert", "terminal-marker"]
        );
    }
}
