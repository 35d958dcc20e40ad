//! Recorder configuration.

use crate::error::{RecordingError, RecordingResult};
use serde::Deserialize;

/// Default number of steps per code unit
pub const DEFAULT_MAX_STEPS_PER_UNIT: usize = 100;

/// Default prefix of generated program names
pub const DEFAULT_PROGRAM_PREFIX: &str = "startup.steps.";

/// Tunables of a recording environment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
    /// Steps after which a code unit is closed and the next one opened
    pub max_steps_per_unit: usize,
    /// Prefix of generated program names
    pub program_prefix: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_steps_per_unit: DEFAULT_MAX_STEPS_PER_UNIT,
            program_prefix: DEFAULT_PROGRAM_PREFIX.to_string(),
        }
    }
}

impl RecorderConfig {
    /// Set the per-unit step ceiling
    pub fn with_max_steps_per_unit(mut self, max: usize) -> Self {
        self.max_steps_per_unit = max;
        self
    }

    /// Set the program name prefix
    pub fn with_program_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.program_prefix = prefix.into();
        self
    }

    /// Parse and validate a configuration from JSON. Missing keys take
    /// their defaults.
    pub fn from_json(json: &str) -> RecordingResult<Self> {
        let config: RecorderConfig =
            serde_json::from_str(json).map_err(|e| RecordingError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration
    pub fn validate(&self) -> RecordingResult<()> {
        if self.max_steps_per_unit == 0 {
            return Err(RecordingError::InvalidConfig(
                "max_steps_per_unit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
