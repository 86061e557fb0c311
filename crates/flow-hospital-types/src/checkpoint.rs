//! Checkpoint snapshots supplied by the workflow engine.
//!
//! The hospital only reads these. The engine owns checkpoint persistence and
//! hands over a snapshot of the failing instance at the moment of failure.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A type-level capability marker carried by a workflow type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMarker(String);

impl CapabilityMarker {
    /// Name of the marker for workflows whose failures need external resolution.
    pub const FINALITY: &'static str = "finality";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Marker for workflow categories that must be held rather than retried or failed.
    pub fn finality() -> Self {
        Self::new(Self::FINALITY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical type of a workflow together with its capability markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowType {
    /// Logical type name (e.g. "finality-handler").
    pub name: String,

    /// Capability markers declared by the type.
    pub markers: BTreeSet<CapabilityMarker>,
}

impl WorkflowType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: BTreeSet::new(),
        }
    }

    /// Add a capability marker.
    pub fn with_marker(mut self, marker: CapabilityMarker) -> Self {
        self.markers.insert(marker);
        self
    }

    pub fn has_marker(&self, marker: &CapabilityMarker) -> bool {
        self.markers.contains(marker)
    }
}

/// Snapshot of a workflow instance at the moment it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Type of the failing workflow.
    pub workflow_type: WorkflowType,

    /// Number of times the instance has been checkpointed.
    pub suspend_count: u32,
}

impl CheckpointState {
    pub fn new(workflow_type: WorkflowType, suspend_count: u32) -> Self {
        Self {
            workflow_type,
            suspend_count,
        }
    }

    pub fn has_marker(&self, marker: &CapabilityMarker) -> bool {
        self.workflow_type.has_marker(marker)
    }
}
