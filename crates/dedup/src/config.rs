use serde::Deserialize;

use crate::error::MergeError;
use crate::strategy::DedupStrategy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration for a consolidation, parsed from TOML.
///
/// The strategy is required: which field the device guarantees unique
/// differs per deployment, so there is no safe default.
#[derive(Debug, Deserialize)]
pub struct MergeConfig {
    pub name: String,
    pub strategy: DedupStrategy,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Tolerance + Input + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    /// Component-wise proximity bound for the diagnostic near-duplicate
    /// report. Never used for survivor selection.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
        }
    }
}

fn default_epsilon() -> f64 {
    1e-6
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Session folder, relative to the config file's directory.
    pub dir: String,
    /// Glob patterns tried in order; the first with any matches wins, so
    /// a specific device-export pattern can shadow the catch-all.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    /// File names skipped even when a pattern matches (previous outputs).
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_patterns() -> Vec<String> {
    vec!["*.csv".into()]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Combined CSV destination, relative to the config file's directory.
    #[serde(default)]
    pub file: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if !self.strategy.is_key_based() {
            return Err(MergeError::ConfigValidation(format!(
                "strategy '{}' is diagnostic-only and cannot drive a merge",
                self.strategy
            )));
        }
        if !self.tolerance.epsilon.is_finite() || self.tolerance.epsilon <= 0.0 {
            return Err(MergeError::InvalidEpsilon(self.tolerance.epsilon));
        }
        if self.input.patterns.is_empty() {
            return Err(MergeError::ConfigValidation(
                "input.patterns must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
