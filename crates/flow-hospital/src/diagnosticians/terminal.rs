//! Terminal marker diagnostician.

use flow_hospital_types::{
    CapabilityMarker, CheckpointState, Diagnosis, DiagnosticianId, FlowError, FlowId,
    MedicalHistory,
};

use super::Diagnostician;

/// Keeps workflows of a marked type for overnight observation.
///
/// Workflow categories carrying the marker need manual or external
/// resolution on error; they are neither retried nor failed. History is
/// never consulted.
pub struct TerminalMarkerDiagnostician {
    marker: CapabilityMarker,
}

impl TerminalMarkerDiagnostician {
    pub const ID: &'static str = "terminal-marker";

    pub fn new(marker: CapabilityMarker) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> &CapabilityMarker {
        &self.marker
    }
}

impl Default for TerminalMarkerDiagnostician {
    fn default() -> Self {
        Self::new(CapabilityMarker::finality())
    }
}

impl Diagnostician for TerminalMarkerDiagnostician {
    fn id(&self) -> DiagnosticianId {
        DiagnosticianId::new(Self::ID)
    }

    fn consult(
        &self,
        _flow_id: &FlowId,
        state: &CheckpointState,
        _errors: &[FlowError],
        _history: &MedicalHistory,
    ) -> Diagnosis {
        if state.has_marker(&self.marker) {
            Diagnosis::OvernightObservation
        } else {
            Diagnosis::NotMySpecialty
        }
    }
}
