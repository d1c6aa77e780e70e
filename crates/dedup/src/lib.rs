//! `survmerge-dedup` — Survey-point deduplication and consolidation engine.
//!
//! Pure engine crate: receives pre-loaded records, returns survivors plus
//! an audit trail. No CLI or IO dependencies.

pub mod config;
pub mod consolidate;
pub mod error;
pub mod grouper;
pub mod model;
pub mod selector;
pub mod strategy;

pub use config::MergeConfig;
pub use consolidate::consolidate;
pub use error::MergeError;
pub use grouper::proximity_report;
pub use model::{AuditTrail, Consolidation, Position, ProximityReport, Record};
pub use strategy::DedupStrategy;
