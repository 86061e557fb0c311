//! Triage coordinator.
//!
//! Runs one admission cycle per failure: record the admission, consult every
//! diagnostician, aggregate by precedence (discharge, then observation, then
//! propagation), record the outcome, and hand a single directive back to the
//! workflow engine.

use chrono::Utc;
use flow_hospital_types::{
    CheckpointState, Diagnosis, DiagnosticianId, Directive, FlowError, FlowId, HistoryRecord,
    MedicalHistory,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::config::HospitalConfig;
use crate::diagnosticians::{group_verdicts, Staff};
use crate::error::{HospitalError, HospitalResult};
use crate::registry::PatientRegistry;

/// Why a history left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// The instance finished, successfully or by propagating its error.
    Completed,
    /// The engine removed the instance.
    Removed,
    /// The coordinator was shut down.
    Shutdown,
}

/// Events emitted by the coordinator.
#[derive(Debug, Clone)]
pub enum TriageEvent {
    /// An instance was admitted after a failure.
    Admitted { flow_id: FlowId, suspend_count: u32 },

    /// An instance was sent back to retry from its checkpoint.
    Discharged {
        flow_id: FlowId,
        suspend_count: u32,
        by: Vec<DiagnosticianId>,
    },

    /// An instance was parked for overnight observation.
    Observed {
        flow_id: FlowId,
        suspend_count: u32,
        by: Vec<DiagnosticianId>,
    },

    /// No diagnostician claimed the failure; the errors propagate.
    Propagated {
        flow_id: FlowId,
        suspend_count: u32,
        errors: Vec<FlowError>,
    },

    /// An instance's history was removed from the registry.
    Released {
        flow_id: FlowId,
        reason: ReleaseReason,
    },
}

/// Result of one admission cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageOutcome {
    /// Instance that was triaged.
    pub flow_id: FlowId,

    /// Suspend count at admission.
    pub suspend_count: u32,

    /// Directive for the engine.
    pub directive: Directive,

    /// Diagnosticians behind the directive; empty on propagation.
    pub by: Vec<DiagnosticianId>,
}

/// Engine-facing hospital interface.
pub trait FlowHospital: Send + Sync {
    /// A workflow instance failed. Returns what the engine must do next.
    ///
    /// An `Err` means the hospital's own history protocol broke; the engine
    /// should treat it like [`Directive::Propagate`].
    fn notify_failure(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
    ) -> HospitalResult<Directive>;

    /// The instance finished, successfully or through error propagation.
    fn notify_completed(&self, flow_id: &FlowId);

    /// The instance was removed from the engine.
    fn notify_removed(&self, flow_id: &FlowId);

    /// The engine cleaned up the instance's resources. Not a completion.
    fn notify_cleaned(&self, _flow_id: &FlowId) {}
}

/// Coordinates diagnosticians and owns the patient registry.
///
/// Construct one per workflow engine; several may coexist in one process.
pub struct TriageCoordinator {
    /// Configuration.
    config: HospitalConfig,

    /// Diagnosticians, in consultation order.
    staff: Staff,

    /// Histories of instances currently in hospital.
    patients: PatientRegistry,

    /// Event broadcaster.
    event_tx: broadcast::Sender<TriageEvent>,
}

impl TriageCoordinator {
    /// Create a coordinator with the standard staff.
    pub fn new(config: HospitalConfig) -> HospitalResult<Self> {
        let staff = Staff::standard(&config);
        Self::with_staff(config, staff)
    }

    /// Create a coordinator with a custom roster.
    pub fn with_staff(config: HospitalConfig, staff: Staff) -> HospitalResult<Self> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        info!(staff = ?staff.ids(), "Flow hospital opened");

        Ok(Self {
            config,
            staff,
            patients: PatientRegistry::new(),
            event_tx,
        })
    }

    /// Subscribe to triage events.
    ///
    /// Events are sent after the instance's entry is unlocked. When one
    /// instance is triaged from several threads at once, its `Admitted` and
    /// outcome events may interleave with those of the other cycles; use
    /// [`TriageCoordinator::history`] for the ordered record.
    pub fn subscribe(&self) -> broadcast::Receiver<TriageEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    /// Diagnostician ids in consultation order.
    pub fn diagnostician_ids(&self) -> Vec<DiagnosticianId> {
        self.staff.ids()
    }

    /// Run one admission cycle for a failed instance.
    #[instrument(skip_all, fields(flow_id = %flow_id, suspend_count = state.suspend_count))]
    pub fn triage(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
    ) -> HospitalResult<TriageOutcome> {
        let (outcome, outcome_event) = self.patients.with_history(flow_id, |history| {
            self.treat(flow_id, state, errors, history)
        })?;

        // Events go out after the entry guard is released
        let _ = self.event_tx.send(TriageEvent::Admitted {
            flow_id: flow_id.clone(),
            suspend_count: state.suspend_count,
        });
        let _ = self.event_tx.send(outcome_event);

        Ok(outcome)
    }

    /// Admit, consult and record the outcome. Runs under the entry guard.
    fn treat(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
        history: &mut MedicalHistory,
    ) -> HospitalResult<(TriageOutcome, TriageEvent)> {
        let suspend_count = state.suspend_count;
        history.admit(Utc::now(), suspend_count);
        info!(flow_id = %flow_id, suspend_count, "Flow admitted to hospital");

        let verdicts = self.staff.consult_all(flow_id, state, errors, history);
        let winner = group_verdicts(&verdicts).into_iter().next();

        let (directive, by, event) = match winner {
            Some((Diagnosis::Discharge, by)) => {
                info!(flow_id = %flow_id, by = ?by, "Flow error discharged from hospital");
                Self::record(
                    flow_id,
                    history,
                    HistoryRecord::Discharged {
                        at: Utc::now(),
                        suspend_count,
                        by: by.clone(),
                        errors: errors.to_vec(),
                    },
                )?;
                let event = TriageEvent::Discharged {
                    flow_id: flow_id.clone(),
                    suspend_count,
                    by: by.clone(),
                };
                (Directive::RetryFromCheckpoint, by, event)
            }
            Some((Diagnosis::OvernightObservation, by)) => {
                info!(flow_id = %flow_id, by = ?by, "Flow error kept for overnight observation");
                Self::record(
                    flow_id,
                    history,
                    HistoryRecord::Observed {
                        at: Utc::now(),
                        suspend_count,
                        by: by.clone(),
                        errors: errors.to_vec(),
                    },
                )?;
                let event = TriageEvent::Observed {
                    flow_id: flow_id.clone(),
                    suspend_count,
                    by: by.clone(),
                };
                (Directive::Park, by, event)
            }
            Some((Diagnosis::NotMySpecialty, _)) | None => {
                // None of the staff care for these errors
                warn!(
                    flow_id = %flow_id,
                    errors = errors.len(),
                    "Flow error not treatable, propagating"
                );
                let event = TriageEvent::Propagated {
                    flow_id: flow_id.clone(),
                    suspend_count,
                    errors: errors.to_vec(),
                };
                (Directive::Propagate, Vec::new(), event)
            }
        };

        Ok((
            TriageOutcome {
                flow_id: flow_id.clone(),
                suspend_count,
                directive,
                by,
            },
            event,
        ))
    }

    fn record(
        flow_id: &FlowId,
        history: &mut MedicalHistory,
        record: HistoryRecord,
    ) -> HospitalResult<()> {
        history
            .record_outcome(record)
            .map_err(|source| HospitalError::History {
                flow_id: flow_id.clone(),
                source,
            })
    }

    /// Remove an instance's history. Idempotent.
    fn release(&self, flow_id: &FlowId, reason: ReleaseReason) {
        match self.patients.remove(flow_id) {
            Some(history) => {
                info!(
                    flow_id = %flow_id,
                    reason = ?reason,
                    admissions = history.admissions(),
                    "Flow released from hospital"
                );
                let _ = self.event_tx.send(TriageEvent::Released {
                    flow_id: flow_id.clone(),
                    reason,
                });
            }
            None => {
                debug!(flow_id = %flow_id, reason = ?reason, "Flow was not in hospital");
            }
        }
    }

    /// Snapshot of an instance's history.
    pub fn history(&self, flow_id: &FlowId) -> Option<MedicalHistory> {
        self.patients.get(flow_id)
    }

    pub fn is_admitted(&self, flow_id: &FlowId) -> bool {
        self.patients.contains(flow_id)
    }

    /// Number of instances currently in hospital.
    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Ids of instances currently in hospital.
    pub fn patients(&self) -> Vec<FlowId> {
        self.patients.ids()
    }

    /// Snapshot of every history.
    pub fn histories(&self) -> Vec<(FlowId, MedicalHistory)> {
        self.patients.snapshot()
    }

    /// Release every patient. Called when the owning engine stops.
    pub fn shutdown(&self) {
        info!(patients = self.patients.len(), "Closing flow hospital");
        for flow_id in self.patients.ids() {
            self.release(&flow_id, ReleaseReason::Shutdown);
        }
    }
}

impl FlowHospital for TriageCoordinator {
    fn notify_failure(
        &self,
        flow_id: &FlowId,
        state: &CheckpointState,
        errors: &[FlowError],
    ) -> HospitalResult<Directive> {
        self.triage(flow_id, state, errors)
            .map(|outcome| outcome.directive)
    }

    fn notify_completed(&self, flow_id: &FlowId) {
        self.release(flow_id, ReleaseReason::Completed);
    }

    fn notify_removed(&self, flow_id: &FlowId) {
        self.release(flow_id, ReleaseReason::Removed);
    }

    fn notify_cleaned(&self, flow_id: &FlowId) {
        debug!(flow_id = %flow_id, "Flow cleaned, history kept");
    }
}
