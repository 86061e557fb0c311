//! Patient registry: the hospital's only shared mutable state.
//!
//! Maps each failing workflow instance to its medical history. Access to one
//! instance is serialized through the map's entry guard; different instances
//! proceed in parallel.

use dashmap::DashMap;
use flow_hospital_types::{FlowId, MedicalHistory};

/// Concurrent map from workflow instance to medical history.
#[derive(Debug, Default)]
pub struct PatientRegistry {
    patients: DashMap<FlowId, MedicalHistory>,
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on the history of `flow_id`, creating an empty one if needed.
    ///
    /// The entry stays write-locked until `f` returns, so concurrent calls for
    /// the same instance are linearized and never create two histories. `f`
    /// must not touch the registry itself.
    pub fn with_history<R>(&self, flow_id: &FlowId, f: impl FnOnce(&mut MedicalHistory) -> R) -> R {
        let mut entry = self.patients.entry(flow_id.clone()).or_default();
        f(entry.value_mut())
    }

    /// Remove and return the history of `flow_id`. Idempotent.
    pub fn remove(&self, flow_id: &FlowId) -> Option<MedicalHistory> {
        self.patients.remove(flow_id).map(|(_, history)| history)
    }

    /// Snapshot of one history.
    pub fn get(&self, flow_id: &FlowId) -> Option<MedicalHistory> {
        self.patients.get(flow_id).map(|history| history.clone())
    }

    pub fn contains(&self, flow_id: &FlowId) -> bool {
        self.patients.contains_key(flow_id)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Ids of all instances currently in hospital.
    pub fn ids(&self) -> Vec<FlowId> {
        self.patients.iter().map(|r| r.key().clone()).collect()
    }

    /// Snapshot of every history.
    pub fn snapshot(&self) -> Vec<(FlowId, MedicalHistory)> {
        self.patients
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Drop every history.
    pub fn clear(&self) {
        self.patients.clear();
    }
}
