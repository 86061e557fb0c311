//! Medical history of a workflow instance.
//!
//! An append-only log of admissions and their outcomes. The hospital keeps one
//! history per failing instance and consults it to break retry loops.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::failure::FlowError;
use crate::ids::DiagnosticianId;

/// One entry in a medical history. Immutable once appended.
#[derive(Debug, Clone)]
pub enum HistoryRecord {
    /// The instance failed and was admitted for triage.
    Admitted { at: DateTime<Utc>, suspend_count: u32 },

    /// The instance was sent back to retry from its checkpoint.
    Discharged {
        at: DateTime<Utc>,
        suspend_count: u32,
        /// Diagnosticians that discharged, in consultation order.
        by: Vec<DiagnosticianId>,
        errors: Vec<FlowError>,
    },

    /// The instance was parked pending an external event.
    Observed {
        at: DateTime<Utc>,
        suspend_count: u32,
        /// Diagnosticians that asked for observation, in consultation order.
        by: Vec<DiagnosticianId>,
        errors: Vec<FlowError>,
    },
}

impl HistoryRecord {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            HistoryRecord::Admitted { at, .. }
            | HistoryRecord::Discharged { at, .. }
            | HistoryRecord::Observed { at, .. } => *at,
        }
    }

    pub fn suspend_count(&self) -> u32 {
        match self {
            HistoryRecord::Admitted { suspend_count, .. }
            | HistoryRecord::Discharged { suspend_count, .. }
            | HistoryRecord::Observed { suspend_count, .. } => *suspend_count,
        }
    }

    /// Attributed diagnosticians; empty for admissions.
    pub fn by(&self) -> &[DiagnosticianId] {
        match self {
            HistoryRecord::Admitted { .. } => &[],
            HistoryRecord::Discharged { by, .. } | HistoryRecord::Observed { by, .. } => by,
        }
    }

    /// Errors that led to the outcome; empty for admissions.
    pub fn errors(&self) -> &[FlowError] {
        match self {
            HistoryRecord::Admitted { .. } => &[],
            HistoryRecord::Discharged { errors, .. } | HistoryRecord::Observed { errors, .. } => {
                errors
            }
        }
    }

    pub fn is_admission(&self) -> bool {
        matches!(self, HistoryRecord::Admitted { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HistoryRecord::Admitted { .. } => "admitted",
            HistoryRecord::Discharged { .. } => "discharged",
            HistoryRecord::Observed { .. } => "observed",
        }
    }
}

impl std::fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.kind(), self.suspend_count(), self.at())?;
        if !self.by().is_empty() {
            let names: Vec<&str> = self.by().iter().map(DiagnosticianId::as_str).collect();
            write!(f, " by [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// Errors raised when appending to a history out of protocol order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Discharge and observation records must answer the latest admission.
    #[error("outcome record must directly follow an admission")]
    OutcomeWithoutAdmission,

    /// Admissions go through [`MedicalHistory::admit`].
    #[error("admission appended as an outcome")]
    NotAnOutcome,
}

/// Ordered, append-only record of one instance's stays in hospital.
#[derive(Debug, Clone, Default)]
pub struct MedicalHistory {
    records: Vec<HistoryRecord>,
}

impl MedicalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    /// Open a new admission cycle.
    pub fn admit(&mut self, at: DateTime<Utc>, suspend_count: u32) {
        self.records.push(HistoryRecord::Admitted { at, suspend_count });
    }

    /// Close the current admission cycle with a discharge or observation.
    pub fn record_outcome(&mut self, record: HistoryRecord) -> Result<(), HistoryError> {
        if record.is_admission() {
            return Err(HistoryError::NotAnOutcome);
        }
        match self.records.last() {
            Some(HistoryRecord::Admitted { .. }) => {
                self.records.push(record);
                Ok(())
            }
            _ => Err(HistoryError::OutcomeWithoutAdmission),
        }
    }

    /// Suspend count of the most recent admission.
    pub fn current_suspend_count(&self) -> Option<u32> {
        self.records.iter().rev().find_map(|record| match record {
            HistoryRecord::Admitted { suspend_count, .. } => Some(*suspend_count),
            _ => None,
        })
    }

    /// Number of discharges attributed to `by` at the given suspend count.
    pub fn discharge_count(&self, by: &DiagnosticianId, suspend_count: u32) -> usize {
        self.records
            .iter()
            .filter(|record| match record {
                HistoryRecord::Discharged {
                    by: staff,
                    suspend_count: at_count,
                    ..
                } => *at_count == suspend_count && staff.contains(by),
                _ => false,
            })
            .count()
    }

    /// Whether `by` has discharged this instance at the current suspend count
    /// no more than `max` times.
    ///
    /// Counts only discharges matching the latest admission's suspend count,
    /// so progress past a checkpoint starts a fresh budget.
    pub fn not_discharged_for_the_same_thing_more_than(
        &self,
        max: usize,
        by: &DiagnosticianId,
    ) -> bool {
        let count = self
            .current_suspend_count()
            .map(|suspend_count| self.discharge_count(by, suspend_count))
            .unwrap_or(0);
        count <= max
    }

    pub fn admissions(&self) -> usize {
        self.records.iter().filter(|r| r.is_admission()).count()
    }

    pub fn discharges(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, HistoryRecord::Discharged { .. }))
            .count()
    }

    pub fn observations(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, HistoryRecord::Observed { .. }))
            .count()
    }
}
