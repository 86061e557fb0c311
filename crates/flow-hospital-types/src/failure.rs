//! Error values raised by failing workflows.
//!
//! Errors reach the hospital as opaque values: a message (the `Display`
//! output) and an optional cause (`Error::source`). The persistence layer's
//! own taxonomy lives here so the classifier can match on it by type.

use std::error::Error as StdError;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Owned, boxed error used as a causal predecessor.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shareable error raised by a workflow instance.
///
/// Kept behind an `Arc` so the same error can be recorded in history and
/// still be surfaced to the workflow's caller on propagation.
pub type FlowError = Arc<dyn StdError + Send + Sync + 'static>;

/// Wrap any error as a [`FlowError`].
pub fn flow_error<E>(error: E) -> FlowError
where
    E: StdError + Send + Sync + 'static,
{
    Arc::new(error)
}

/// Kind of a persistence-layer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceErrorKind {
    /// Generic SQL failure reported by the database.
    Sql,
    /// Primary key, uniqueness or other constraint violation.
    ConstraintViolation,
}

impl std::fmt::Display for PersistenceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceErrorKind::Sql => write!(f, "sql"),
            PersistenceErrorKind::ConstraintViolation => write!(f, "constraint_violation"),
        }
    }
}

/// Database-level errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// SQL failure, e.g. a deadlock reported by the database.
    #[error("sql error: {message}")]
    Sql {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Constraint violation, most often a duplicate primary key.
    #[error("constraint violation on {constraint}: {message}")]
    ConstraintViolation {
        constraint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl PersistenceError {
    pub fn sql(message: impl Into<String>) -> Self {
        PersistenceError::Sql {
            message: message.into(),
            source: None,
        }
    }

    pub fn constraint_violation(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        PersistenceError::ConstraintViolation {
            constraint: constraint.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach a causal predecessor.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            PersistenceError::Sql { source, .. }
            | PersistenceError::ConstraintViolation { source, .. } => {
                *source = Some(cause.into());
            }
        }
        self
    }

    pub fn kind(&self) -> PersistenceErrorKind {
        match self {
            PersistenceError::Sql { .. } => PersistenceErrorKind::Sql,
            PersistenceError::ConstraintViolation { .. } => {
                PersistenceErrorKind::ConstraintViolation
            }
        }
    }
}

/// Generic failure raised by workflow code, optionally wrapping a cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FlowFailure {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl FlowFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// A failure caused by another error.
    pub fn caused_by(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_kind() {
        assert_eq!(PersistenceError::sql("boom").kind(), PersistenceErrorKind::Sql);
        assert_eq!(
            PersistenceError::constraint_violation("pk_tx", "dup").kind(),
            PersistenceErrorKind::ConstraintViolation
        );
    }

    #[test]
    fn test_cause_chain() {
        let root = PersistenceError::sql("deadlock detected");
        let failure = FlowFailure::caused_by("commit failed", root);

        let cause = failure.source().expect("cause");
        assert_eq!(cause.to_string(), "sql error: deadlock detected");
        assert!(cause.downcast_ref::<PersistenceError>().is_some());
        assert!(cause.source().is_none());
    }

    #[test]
    fn test_with_source() {
        let err = PersistenceError::constraint_violation("pk_tx", "duplicate key")
            .with_source(FlowFailure::new("driver"));
        assert_eq!(err.source().map(|e| e.to_string()), Some("driver".to_string()));
    }
}
