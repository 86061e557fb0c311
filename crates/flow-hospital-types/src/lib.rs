//! Flow Hospital Types - Core types for workflow failure triage
//!
//! The flow hospital decides what happens to a checkpointed workflow instance
//! that failed with a runtime error: retry it from its last checkpoint, park
//! it until an external event resumes it, or let the error propagate.
//!
//! ## Architectural Boundaries
//!
//! - **Workflow engine** owns: scheduling, suspension, checkpoint persistence
//! - **Persistence layer** owns: raising database-level errors
//! - **Flow hospital** owns: classifying failures and issuing directives
//!
//! ## Key Concepts
//!
//! - **CheckpointState**: Snapshot of the failing instance (type markers, suspend count)
//! - **Diagnosis**: A diagnostician's verdict, ordered by precedence
//! - **Directive**: The single decision handed back to the engine per admission
//! - **MedicalHistory**: Append-only log of admissions and outcomes

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod checkpoint;
pub mod diagnosis;
pub mod failure;
pub mod history;
pub mod ids;

// Re-export main types
pub use checkpoint::{CapabilityMarker, CheckpointState, WorkflowType};
pub use diagnosis::{Diagnosis, Directive};
pub use failure::{
    flow_error, BoxError, FlowError, FlowFailure, PersistenceError, PersistenceErrorKind,
};
pub use history::{HistoryError, HistoryRecord, MedicalHistory};
pub use ids::{DiagnosticianId, FlowId};
