//! Hospital configuration.
//!
//! Defines classifier signatures, the duplicate-insert retry bound, the
//! terminal marker, and event fan-out capacity.

use flow_hospital_types::CapabilityMarker;
use serde::{Deserialize, Serialize};

use crate::classifier::ErrorSignature;
use crate::error::{HospitalError, HospitalResult};

/// Configuration for the flow hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalConfig {
    /// Error classifier configuration.
    pub classifier: ClassifierConfig,

    /// Duplicate-insert diagnostician configuration.
    pub duplicate_insert: DuplicateInsertConfig,

    /// Terminal-marker diagnostician configuration.
    pub terminal_marker: TerminalMarkerConfig,

    /// Buffer size of the triage event channel.
    pub event_capacity: usize,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            duplicate_insert: DuplicateInsertConfig::default(),
            terminal_marker: TerminalMarkerConfig::default(),
            event_capacity: 1024,
        }
    }
}

impl HospitalConfig {
    /// Load configuration from defaults, an optional file, and `HOSPITAL_`
    /// environment variables (nested keys separated by `__`).
    pub fn load(path: Option<&str>) -> HospitalResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&HospitalConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Add environment variables, e.g. HOSPITAL_DUPLICATE_INSERT__MAX_DISCHARGES=5
        builder = builder.add_source(
            config::Environment::with_prefix("HOSPITAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: HospitalConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Set the duplicate-insert discharge bound.
    pub fn with_duplicate_insert_bound(mut self, max_discharges: usize) -> Self {
        self.duplicate_insert.max_discharges = max_discharges;
        self
    }

    /// Check values that would make the hospital unusable.
    pub fn validate(&self) -> HospitalResult<()> {
        if self.classifier.max_cause_depth == 0 {
            return Err(HospitalError::ConfigurationError(
                "classifier.max_cause_depth must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(HospitalError::ConfigurationError(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Maximum number of links followed along a cause chain.
    pub max_cause_depth: usize,

    /// Signature of transient resource contention.
    pub contention: ErrorSignature,

    /// Signature of duplicate-key and uniqueness violations.
    pub duplicate_key: ErrorSignature,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_cause_depth: 32,
            contention: ErrorSignature::contention(),
            duplicate_key: ErrorSignature::duplicate_key(),
        }
    }
}

/// Duplicate-insert diagnostician configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateInsertConfig {
    /// Prior discharges allowed per suspend count before the diagnostician
    /// stops discharging.
    pub max_discharges: usize,
}

impl Default for DuplicateInsertConfig {
    fn default() -> Self {
        Self { max_discharges: 3 }
    }
}

/// Terminal-marker diagnostician configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalMarkerConfig {
    /// Marker identifying workflow types held for external resolution.
    pub marker: CapabilityMarker,
}

impl Default for TerminalMarkerConfig {
    fn default() -> Self {
        Self {
            marker: CapabilityMarker::finality(),
        }
    }
}
