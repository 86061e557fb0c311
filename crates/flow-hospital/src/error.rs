//! Error types for flow-hospital crate.
//!
//! Triage itself never fails: every admission ends in a directive. These
//! errors cover construction, configuration, and history protocol breaches.

use flow_hospital_types::{DiagnosticianId, FlowId, HistoryError};
use thiserror::Error;

/// Errors that can occur while setting up or operating the hospital.
#[derive(Debug, Error)]
pub enum HospitalError {
    /// Two diagnosticians share the same id.
    #[error("duplicate diagnostician: {0}")]
    DuplicateDiagnostician(DiagnosticianId),

    /// History append out of protocol order.
    #[error("history protocol violated for {flow_id}: {source}")]
    History {
        flow_id: FlowId,
        #[source]
        source: HistoryError,
    },

    /// Configuration value rejected by validation.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

/// Result type for hospital operations.
pub type HospitalResult<T> = Result<T, HospitalError>;
