//! Transient contention diagnostician.
//!
//! Discharges instances that failed on infrastructure-level resource
//! conflicts such as database deadlocks. Retrying is always safe, so the
//! history is never consulted and there is no discharge limit.

use flow_hospital_types::{
    CheckpointState, Diagnosis, DiagnosticianId, FlowError, FlowId, MedicalHistory,
};

use super::Diagnostician;
use crate::classifier::{ErrorCategory, ErrorClassifier};

/// Discharges on transient resource contention anywhere in the errors.
pub struct TransientContentionDiagnostician {
    classifier: ErrorClassifier,
}

impl TransientContentionDiagnostician {
    pub const ID: &'static str = "transient-contention";

    pub fn new(classifier: ErrorClassifier) -> Self {
        Self { classifier }
    }
}

impl Default for TransientContentionDiagnostician {
    fn default() -> Self {
        Self::new(ErrorClassifier::default())
    }
}

impl Diagnostician for TransientContentionDiagnostician {
    fn id(&self) -> DiagnosticianId {
        DiagnosticianId::new(Self::ID)
    }

    fn consult(
        &self,
        _flow_id: &FlowId,
        _state: &CheckpointState,
        errors: &[FlowError],
        _history: &MedicalHistory,
    ) -> Diagnosis {
        if self
            .classifier
            .matches_any(ErrorCategory::TransientContention, errors)
        {
            Diagnosis::Discharge
        } else {
            Diagnosis::NotMySpecialty
        }
    }
}
