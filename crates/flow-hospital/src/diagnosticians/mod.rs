//! Diagnosticians consulted on every admission.
//!
//! Each diagnostician inspects a failed instance and returns a [`Diagnosis`].
//! The standard staff covers:
//! - Transient contention: database deadlocks, always retried
//! - Duplicate inserts: constraint violations, retried a bounded number of times
//! - Terminal markers: workflow types held for external resolution

mod duplicate;
mod terminal;
mod transient;

pub use duplicate::DuplicateInsertDiagnostician;
pub use terminal::TerminalMarkerDiagnostician;
pub use transient::TransientContentionDiagnostician;

use std::collections::HashSet;

use flow_hospital_types::{
    CheckpointState, Diagnosis, DiagnosticianId, FlowError, FlowId, MedicalHistory,
};
use tracing::debug;

use crate::classifier::ErrorClassifier;
use crate::config::HospitalConfig;
use crate::error::{HospitalError, HospitalResult};

/// A pluggable rule that classifies a failure and recommends a verdict.
///
/// Implementations run while the instance's history is locked and must not
/// call back into the coordinator. A panic is not treated as abstention.
pub trait Diagnostician: Send + Sync {
    /// Stable identity recorded in discharge and observation records.
    fn id(&self) -> DiagnosticianId;

    /// Examine a failed instance.
    fn consult(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
        history: &MedicalHistory,
    ) -> Diagnosis;
}

/// Ordered collection of diagnosticians.
pub struct Staff {
    members: Vec<Box<dyn Diagnostician>>,
}

impl Staff {
    /// Create an empty roster. With no staff every failure propagates.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// The standard roster: contention, duplicate insert, terminal marker.
    pub fn standard(config: &HospitalConfig) -> Self {
        let classifier = ErrorClassifier::new(&config.classifier);
        Self {
            members: vec![
                Box::new(TransientContentionDiagnostician::new(classifier.clone())),
                Box::new(DuplicateInsertDiagnostician::new(
                    classifier,
                    config.duplicate_insert.max_discharges,
                )),
                Box::new(TerminalMarkerDiagnostician::new(
                    config.terminal_marker.marker.clone(),
                )),
            ],
        }
    }

    /// Build a roster from an ordered list, rejecting duplicate ids.
    pub fn from_members(members: Vec<Box<dyn Diagnostician>>) -> HospitalResult<Self> {
        let mut staff = Self::new();
        for member in members {
            staff.add(member)?;
        }
        Ok(staff)
    }

    /// Append a diagnostician; it is consulted after all current members.
    pub fn add(&mut self, member: Box<dyn Diagnostician>) -> HospitalResult<()> {
        let id = member.id();
        if self.members.iter().any(|existing| existing.id() == id) {
            return Err(HospitalError::DuplicateDiagnostician(id));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ids in consultation order.
    pub fn ids(&self) -> Vec<DiagnosticianId> {
        self.members.iter().map(|member| member.id()).collect()
    }

    /// Ask every diagnostician, in order, with no early exit.
    pub fn consult_all(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
        history: &MedicalHistory,
    ) -> Vec<(DiagnosticianId, Diagnosis)> {
        self.members
            .iter()
            .map(|member| {
                let diagnosis = member.consult(flow_id, state, errors, history);
                let id = member.id();
                debug!(flow_id = %flow_id, diagnostician = %id, diagnosis = %diagnosis, "Consulted");
                (id, diagnosis)
            })
            .collect()
    }
}

impl Default for Staff {
    fn default() -> Self {
        Self::standard(&HospitalConfig::default())
    }
}

/// Group verdicts by diagnosis, dropping abstentions.
///
/// Each group keeps consultation order and lists an id at most once.
pub fn group_verdicts(
    verdicts: &[(DiagnosticianId, Diagnosis)],
) -> Vec<(Diagnosis, Vec<DiagnosticianId>)> {
    let mut groups: Vec<(Diagnosis, Vec<DiagnosticianId>)> = Vec::new();
    let mut seen: HashSet<(Diagnosis, &DiagnosticianId)> = HashSet::new();

    for (id, diagnosis) in verdicts {
        if !diagnosis.is_decisive() || !seen.insert((*diagnosis, id)) {
            continue;
        }
        match groups.iter_mut().find(|(d, _)| d == diagnosis) {
            Some((_, ids)) => ids.push(id.clone()),
            None => groups.push((*diagnosis, vec![id.clone()])),
        }
    }

    groups.sort_by_key(|(diagnosis, _)| *diagnosis);
    groups
}

/// Diagnostician returning a fixed verdict, for wiring tests.
pub struct StaticDiagnostician {
    id: DiagnosticianId,
    diagnosis: Diagnosis,
}

impl StaticDiagnostician {
    pub fn new(id: impl Into<String>, diagnosis: Diagnosis) -> Self {
        Self {
            id: DiagnosticianId::new(id),
            diagnosis,
        }
    }
}

impl Diagnostician for StaticDiagnostician {
    fn id(&self) -> DiagnosticianId {
        self.id.clone()
    }

    fn consult(
        &self,
        _flow_id: &FlowId,
        _state: &CheckpointState,
        _errors: &[FlowError],
        _history: &MedicalHistory,
    ) -> Diagnosis {
        self.diagnosis
    }
}
