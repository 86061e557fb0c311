//! Error classification over causal chains.
//!
//! An error matches a category if any error along its cause chain carries the
//! category's signature. Chain walks are bounded by depth and stop on the
//! first repeated link, so self-referential chains terminate.

use std::collections::HashSet;
use std::error::Error as StdError;

use flow_hospital_types::{FlowError, PersistenceError, PersistenceErrorKind};
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;

/// Failure categories recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Infrastructure-level resource conflict such as a database deadlock.
    TransientContention,
    /// Duplicate primary key or other uniqueness violation.
    DuplicateKey,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::TransientContention => write!(f, "transient contention"),
            ErrorCategory::DuplicateKey => write!(f, "duplicate key"),
        }
    }
}

/// Which errors message fragments are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchScope {
    /// Only errors raised by the persistence layer.
    PersistenceOnly,
    /// Any error in the chain.
    AnyError,
}

/// How a category is recognized on a single error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorSignature {
    /// Persistence error kinds that match outright.
    pub kinds: Vec<PersistenceErrorKind>,

    /// Case-insensitive message fragments.
    pub fragments: Vec<String>,

    /// Errors eligible for fragment matching.
    pub scope: MatchScope,
}

impl Default for ErrorSignature {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            fragments: Vec::new(),
            scope: MatchScope::PersistenceOnly,
        }
    }
}

impl ErrorSignature {
    /// Database deadlocks.
    pub fn contention() -> Self {
        Self {
            kinds: Vec::new(),
            fragments: vec!["deadlock".to_string()],
            scope: MatchScope::PersistenceOnly,
        }
    }

    /// Constraint violations and duplicate-key messages.
    pub fn duplicate_key() -> Self {
        Self {
            kinds: vec![PersistenceErrorKind::ConstraintViolation],
            fragments: vec!["duplicate key".to_string(), "unique constraint".to_string()],
            scope: MatchScope::PersistenceOnly,
        }
    }

    /// Whether this single error (ignoring its causes) carries the signature.
    pub fn matches_error(&self, error: &(dyn StdError + 'static)) -> bool {
        let persistence = error.downcast_ref::<PersistenceError>();

        if let Some(persistence) = persistence {
            if self.kinds.contains(&persistence.kind()) {
                return true;
            }
        }

        if self.fragments.is_empty() {
            return false;
        }
        if self.scope == MatchScope::PersistenceOnly && persistence.is_none() {
            return false;
        }

        let message = error.to_string().to_lowercase();
        self.fragments
            .iter()
            .any(|fragment| message.contains(&fragment.to_lowercase()))
    }
}

/// Iterator over an error and its causes.
///
/// Yields at most `max_depth` errors and never yields the same error twice.
pub struct CauseChain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
    remaining: usize,
    seen: HashSet<*const ()>,
}

impl<'a> Iterator for CauseChain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next.take()?;
        let address = current as *const (dyn StdError + 'static) as *const ();
        if !self.seen.insert(address) {
            return None;
        }
        self.remaining -= 1;
        self.next = current.source();
        Some(current)
    }
}

/// Walk `error` and its causes, bounded by `max_depth`.
pub fn cause_chain<'a>(error: &'a (dyn StdError + 'static), max_depth: usize) -> CauseChain<'a> {
    CauseChain {
        next: Some(error),
        remaining: max_depth,
        seen: HashSet::new(),
    }
}

/// Stateless matcher for the known failure categories.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    max_cause_depth: usize,
    contention: ErrorSignature,
    duplicate_key: ErrorSignature,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl ErrorClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            max_cause_depth: config.max_cause_depth,
            contention: config.contention.clone(),
            duplicate_key: config.duplicate_key.clone(),
        }
    }

    pub fn signature(&self, category: ErrorCategory) -> &ErrorSignature {
        match category {
            ErrorCategory::TransientContention => &self.contention,
            ErrorCategory::DuplicateKey => &self.duplicate_key,
        }
    }

    /// Whether any error in the cause chain of `error` belongs to `category`.
    pub fn matches(&self, category: ErrorCategory, error: &(dyn StdError + 'static)) -> bool {
        let signature = self.signature(category);
        cause_chain(error, self.max_cause_depth).any(|link| signature.matches_error(link))
    }

    /// Whether any of `errors` belongs to `category`.
    pub fn matches_any(&self, category: ErrorCategory, errors: &[FlowError]) -> bool {
        errors
            .iter()
            .any(|error| self.matches(category, error.as_ref()))
    }

    pub fn is_contention(&self, error: &(dyn StdError + 'static)) -> bool {
        self.matches(ErrorCategory::TransientContention, error)
    }

    pub fn is_duplicate_key(&self, error: &(dyn StdError + 'static)) -> bool {
        self.matches(ErrorCategory::DuplicateKey, error)
    }

    /// All categories `error` belongs to.
    pub fn categories_of(&self, error: &(dyn StdError + 'static)) -> Vec<ErrorCategory> {
        [ErrorCategory::TransientContention, ErrorCategory::DuplicateKey]
            .into_iter()
            .filter(|category| self.matches(*category, error))
            .collect()
    }
}
