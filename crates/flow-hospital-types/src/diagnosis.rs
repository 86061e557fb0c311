//! Verdicts returned by diagnosticians and directives issued to the engine.

use serde::{Deserialize, Serialize};

/// Verdict of a single diagnostician.
///
/// Variants are declared in precedence order: when diagnosticians disagree,
/// `Discharge` beats `OvernightObservation`, and `NotMySpecialty` never
/// contributes to the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    /// Retry from the last checkpoint.
    Discharge,

    /// Park the instance; only an external event resumes it.
    OvernightObservation,

    /// Abstain, let another member of staff decide.
    NotMySpecialty,
}

impl Diagnosis {
    /// Whether this verdict takes part in aggregation.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, Diagnosis::NotMySpecialty)
    }

    /// The directive the engine receives when this verdict wins.
    pub fn directive(&self) -> Directive {
        match self {
            Diagnosis::Discharge => Directive::RetryFromCheckpoint,
            Diagnosis::OvernightObservation => Directive::Park,
            Diagnosis::NotMySpecialty => Directive::Propagate,
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnosis::Discharge => write!(f, "discharge"),
            Diagnosis::OvernightObservation => write!(f, "overnight observation"),
            Diagnosis::NotMySpecialty => write!(f, "not my specialty"),
        }
    }
}

/// Decision handed back to the workflow engine, exactly one per admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Roll back to the last checkpoint and run again.
    RetryFromCheckpoint,

    /// Keep the instance suspended; resumption is an external decision.
    Park,

    /// Surface the original error as a fatal failure of the instance.
    Propagate,
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directive::RetryFromCheckpoint => write!(f, "retry from checkpoint"),
            Directive::Park => write!(f, "park"),
            Directive::Propagate => write!(f, "propagate"),
        }
    }
}
