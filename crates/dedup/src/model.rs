use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::strategy::DedupStrategy;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One survey measurement as exported by the field device.
///
/// Records are never mutated after load; the engine only selects and
/// discards whole records.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Device-assigned GUID. Intended unique per physical measurement,
    /// but session files can repeat it. Empty when the export is damaged.
    pub identifier: String,
    /// Operator-assigned point name/number. Not unique.
    pub label: String,
    /// Measured point location. `None` when the coordinate cells were empty.
    pub position: Option<Position>,
    /// Rover location at capture time. Distinct from `position`.
    pub rover_position: Option<Position>,
    /// Capture time; used for final ordering, never for survivor selection.
    pub timestamp: DateTime<Utc>,
    /// Device status code, treated as opaque.
    pub status: u8,
    /// Name of the session file this record was loaded from.
    /// Provenance only, never part of an identity key.
    pub origin: String,
}

/// (longitude, latitude, altitude) as degrees / degrees / length units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

/// Bit-exact, hashable form of a position for key-based grouping.
pub type PositionKey = (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>);

impl Position {
    pub fn key(&self) -> PositionKey {
        (
            OrderedFloat(self.longitude),
            OrderedFloat(self.latitude),
            OrderedFloat(self.altitude),
        )
    }

    /// True when every component differs by less than `epsilon`.
    pub fn within(&self, other: &Position, epsilon: f64) -> bool {
        (self.longitude - other.longitude).abs() < epsilon
            && (self.latitude - other.latitude).abs() < epsilon
            && (self.altitude - other.altitude).abs() < epsilon
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Indices of records sharing one identity key, in ingestion order.
/// Always has at least two members.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub members: Vec<usize>,
}

/// Output of key-based grouping over the full record sequence.
#[derive(Debug)]
pub struct Grouping {
    /// Duplicate groups, ordered by first ingestion occurrence.
    pub groups: Vec<DuplicateGroup>,
    /// Indices of records whose key matched nothing else.
    pub singletons: Vec<usize>,
    /// Records the strategy could not key.
    pub rejected: Vec<RejectedRecord>,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// A duplicate that lost survivor selection, with enough provenance to
/// trace it back to its session file.
#[derive(Debug, Clone, Serialize)]
pub struct DiscardedRecord {
    pub identifier: String,
    pub label: String,
    pub origin: String,
    pub timestamp: DateTime<Utc>,
    pub survivor_identifier: String,
    pub survivor_label: String,
    pub survivor_origin: String,
}

/// A record excluded from grouping because the chosen strategy needs a
/// field it does not carry. Listed, never silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    /// Ingestion index of the record.
    pub index: usize,
    pub identifier: String,
    pub label: String,
    pub origin: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingIdentifier,
    MissingLabel,
    MissingPosition,
    MissingRoverPosition,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier => write!(f, "missing identifier"),
            Self::MissingLabel => write!(f, "missing label"),
            Self::MissingPosition => write!(f, "missing position"),
            Self::MissingRoverPosition => write!(f, "missing rover position"),
        }
    }
}

/// Everything a renderer needs to describe a run without recomputation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditTrail {
    pub strategy: DedupStrategy,
    pub total_input: usize,
    pub duplicate_groups: usize,
    pub total_after: usize,
    pub discarded: Vec<DiscardedRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Result of one consolidation run.
#[derive(Debug)]
pub struct Consolidation {
    /// Deduplicated records, non-decreasing by timestamp (ingestion order
    /// breaks ties).
    pub survivors: Vec<Record>,
    pub audit: AuditTrail,
}

// ---------------------------------------------------------------------------
// Proximity diagnostics
// ---------------------------------------------------------------------------

/// One pair of records whose positions are within epsilon of each other.
///
/// Pairs are reported independently: proximity is not transitive, so a
/// record may appear in several pairs and pairs are never merged into
/// clusters.
#[derive(Debug, Clone, Serialize)]
pub struct ProximityPair {
    pub left_index: usize,
    pub right_index: usize,
    pub left_identifier: String,
    pub right_identifier: String,
    pub left_origin: String,
    pub right_origin: String,
    /// Component-wise absolute deltas (longitude, latitude, altitude).
    pub delta: [f64; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct ProximityReport {
    pub epsilon: f64,
    pub total_input: usize,
    pub pairs: Vec<ProximityPair>,
    pub rejected: Vec<RejectedRecord>,
}
