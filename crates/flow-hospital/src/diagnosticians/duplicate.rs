//! Duplicate insert diagnostician.
//!
//! Detects primary key and other constraint violations, typically a
//! non-idempotent insert replayed after a retry. Such conflicts may be
//! deterministic, so discharges are bounded per suspend count.

use flow_hospital_types::{
    CheckpointState, Diagnosis, DiagnosticianId, FlowError, FlowId, MedicalHistory,
};
use tracing::info;

use super::Diagnostician;
use crate::classifier::{ErrorCategory, ErrorClassifier};

/// Discharges duplicate-key conflicts until the same checkpoint has been
/// discharged by this diagnostician more than `max_discharges` times.
///
/// The bound is keyed on the suspend count only, not on which conflict was
/// raised: two different deterministic conflicts at one checkpoint share it.
pub struct DuplicateInsertDiagnostician {
    classifier: ErrorClassifier,
    max_discharges: usize,
}

impl DuplicateInsertDiagnostician {
    pub const ID: &'static str = "duplicate-insert";

    pub fn new(classifier: ErrorClassifier, max_discharges: usize) -> Self {
        Self {
            classifier,
            max_discharges,
        }
    }

    pub fn max_discharges(&self) -> usize {
        self.max_discharges
    }
}

impl Default for DuplicateInsertDiagnostician {
    fn default() -> Self {
        Self::new(ErrorClassifier::default(), 3)
    }
}

impl Diagnostician for DuplicateInsertDiagnostician {
    fn id(&self) -> DiagnosticianId {
        DiagnosticianId::new(Self::ID)
    }

    fn consult(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
        history: &MedicalHistory,
    ) -> Diagnosis {
        if !self.classifier.matches_any(ErrorCategory::DuplicateKey, errors) {
            return Diagnosis::NotMySpecialty;
        }

        if history.not_discharged_for_the_same_thing_more_than(self.max_discharges, &self.id()) {
            Diagnosis::Discharge
        } else {
            info!(
                flow_id = %flow_id,
                suspend_count = state.suspend_count,
                max_discharges = self.max_discharges,
                "Duplicate insert keeps recurring at the same checkpoint"
            );
            Diagnosis::NotMySpecialty
        }
    }
}
