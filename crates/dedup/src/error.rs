use std::fmt;

use crate::strategy::DedupStrategy;

#[derive(Debug)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty pattern list, bad strategy, etc.).
    ConfigValidation(String),
    /// Strategy cannot drive a consolidation run (tolerance mode is
    /// diagnostic-only).
    UnsupportedStrategy(DedupStrategy),
    /// Proximity epsilon must be finite and greater than zero.
    InvalidEpsilon(f64),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnsupportedStrategy(strategy) => {
                write!(
                    f,
                    "strategy '{strategy}' is pairwise-diagnostic only and cannot select survivors"
                )
            }
            Self::InvalidEpsilon(value) => {
                write!(f, "tolerance epsilon must be finite and > 0, got {value}")
            }
        }
    }
}

impl std::error::Error for MergeError {}
